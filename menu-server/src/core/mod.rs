//! Core module: configuration, state and errors
//!
//! - [`Config`] - server configuration
//! - [`ServerState`] - shared service handles
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup and serving errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{BossAccount, Config};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
