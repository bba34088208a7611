//! Common types for the shared crate

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Menu entity identifier (snowflake)
pub type EntityId = i64;

/// User identifier
pub type UserId = i64;
