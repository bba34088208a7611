//! Authentication and authorization
//!
//! - [`JwtService`] - token issuing and validation
//! - [`CurrentUser`] / [`MaybeUser`] - request extractors
//! - [`policy`] - role policy engine
//! - [`password`] - argon2 hashing

pub mod extractor;
pub mod jwt;
pub mod password;
pub mod policy;

pub use extractor::MaybeUser;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use policy::{Action, Decision, Resource, authorize};
