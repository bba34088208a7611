//! Storage layer
//!
//! - [`ContentStore`] - menu entities and translations, per-entity write gates
//! - [`UserDirectory`] - accounts and credentials
//! - [`lock`] - bounded, cancellable lock acquisition

pub mod content;
pub mod lock;
pub mod users;

pub use content::{ContentStore, DEFAULT_LOCK_TIMEOUT, ListQuery, SortKey};
pub use lock::LockError;
pub use users::UserDirectory;
