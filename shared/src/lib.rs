//! Shared types for the digital menu service
//!
//! Common types used across crates: the unified error model, menu and user
//! models, locale tags and small utilities.

pub mod error;
pub mod locale;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use locale::{InvalidLocale, Locale};
