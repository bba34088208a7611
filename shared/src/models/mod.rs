//! Data models
//!
//! Shared between menu-server and clients (via API).
//! All IDs are `i64` snowflakes.

pub mod category;
pub mod company;
pub mod entity;
pub mod ingredient;
pub mod product;
pub mod role;
pub mod translation;
pub mod user;

// Re-exports
pub use category::*;
pub use company::*;
pub use entity::*;
pub use ingredient::*;
pub use product::*;
pub use role::*;
pub use translation::*;
pub use user::*;
