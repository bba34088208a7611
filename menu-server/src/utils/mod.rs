//! Utilities
//!
//! - [`logger`] - tracing subscriber setup
//! - [`ok`] - success envelope helper

pub mod logger;

use axum::Json;
use serde::Serialize;
use shared::ApiResponse;

/// Wrap `data` in a success envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Wrap `data` in a success envelope with a custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success_with_message(message, data))
}
