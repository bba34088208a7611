//! HTTP API
//!
//! - [`health`] - liveness
//! - [`auth`] - login, self-registration, own profile
//! - [`users`] - account administration
//! - [`content`] - menu entities and translations, one router per kind

pub mod auth;
pub mod content;
pub mod health;
pub mod users;

use std::time::Duration;

use axum::Router;
use http::{HeaderName, HeaderValue};
use shared::util::snowflake_id;
use shared::{AppError, AppResult};
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        Some(RequestId::new(HeaderValue::from(snowflake_id())))
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        // Auth API - login is public, profile routes need a token
        .merge(auth::router())
        // User administration - boss only, enforced by the mediator
        .merge(users::router())
        // Menu content - anonymous reads, role-checked writes
        .merge(content::router())
}

/// Build a fully configured application with all middleware
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Bound in-flight requests
        .layer(GlobalConcurrencyLimitLayer::new(
            state.config.max_connections.max(1),
        ))
        // ========== Request ID ==========
        // Last layer added runs first: Set must wrap Propagate
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
}

/// Run store work on the blocking pool
///
/// The token is cancelled when the request future is dropped (client went
/// away) or when the configured request timeout elapses, so a write waiting
/// on an entity gate gives up instead of outliving its request.
pub(crate) async fn run_blocking<T, F>(state: &ServerState, work: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> AppResult<T> + Send + 'static,
{
    run_with_timeout(state.config.request_timeout(), work).await
}

/// After the timeout the worker is cancelled and then awaited, so the caller
/// sees `RequestCancelled` only when nothing was committed.
async fn run_with_timeout<T, F>(timeout: Duration, work: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> AppResult<T> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let token = cancel.clone();

    let mut handle = tokio::task::spawn_blocking(move || work(&token));
    let joined = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(joined) => joined,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Request timed out, cancelling"
            );
            handle.await
        }
    };
    let _ = guard.disarm();

    joined.map_err(|e| AppError::internal(format!("Request worker failed: {}", e)))?
}
