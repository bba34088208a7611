//! Menu Server - access control and content resolution for a digital menu
//!
//! # Architecture
//!
//! - **Policy** (`auth::policy`): role × resource × action → allow/deny, fail-closed
//! - **Locale resolution** (`i18n`): deterministic translation fallback chain
//! - **Store** (`store`): in-memory menu entities with per-entity write gates
//! - **Mediator** (`mediator`): authorize, then resolve or write
//! - **HTTP API** (`api`): axum routes over the mediator
//!
//! # Module layout
//!
//! ```text
//! menu-server/src/
//! ├── core/          # config, state, errors, server
//! ├── auth/          # JWT, argon2, extractors, policy
//! ├── i18n/          # locale resolver
//! ├── store/         # content store, user directory, lock helper
//! ├── mediator/      # request mediation
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logger, response helpers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod i18n;
pub mod mediator;
pub mod store;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use mediator::{ContentRequest, ContentResponse, Mediator};
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env` and initialize logging
///
/// Logging settings are read straight from the environment so that
/// configuration errors are logged too.
pub fn setup_environment() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(false);
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty());

    init_logger_with_file(log_level.as_deref(), log_json, log_dir.as_deref())
}

pub fn print_banner() {
    println!(
        r#"
    __  ___
   /  |/  /__  ____  __  __
  / /|_/ / _ \/ __ \/ / / /
 / /  / /  __/ / / / /_/ /
/_/  /_/\___/_/ /_/\__,_/
    "#
    );
}
