//! User Model

use super::Role;
use crate::types::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// User account (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub address: Option<String>,
    pub location: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    /// Bumped on role change and deactivation; tokens carrying an older
    /// value are rejected.
    pub credential_version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Registration payload (clients self-register, employees are created by the boss)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Own-profile update payload
///
/// Role, active flag and password are not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub location: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
}

/// Change password payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}
