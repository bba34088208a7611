//! Role Model

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Staff/customer role (closed set)
///
/// Wire values follow the menu backend: `client`, `employe`, `boss`.
/// `employee` is accepted as an input alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "employe", alias = "employee")]
    Employee,
    #[serde(rename = "boss")]
    Boss,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Employee => "employe",
            Role::Boss => "boss",
        }
    }

    /// Strict parse, used for request bodies and paths
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "employe" | "employee" => Ok(Role::Employee),
            "boss" => Ok(Role::Boss),
            _ => Err(AppError::with_message(
                ErrorCode::InvalidRole,
                format!("Unknown role: {}", raw),
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Role carried by a credential
///
/// Tokens minted by older deployments may carry role names this build does
/// not know. They are kept as `Unrecognized` and the policy engine denies
/// every action for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleClaim {
    Known(Role),
    Unrecognized(String),
}

impl RoleClaim {
    pub fn from_claim(raw: &str) -> Self {
        match Role::parse(raw) {
            Ok(role) => RoleClaim::Known(role),
            Err(_) => RoleClaim::Unrecognized(raw.to_string()),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            RoleClaim::Known(role) => Some(*role),
            RoleClaim::Unrecognized(_) => None,
        }
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim::Known(role)
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleClaim::Known(role) => role.fmt(f),
            RoleClaim::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// Change role payload (admin action)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleChange {
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_values() {
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"employe\"");
        let role: Role = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(role, Role::Employee);
        let role: Role = serde_json::from_str("\"boss\"").unwrap();
        assert_eq!(role, Role::Boss);
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        let err = Role::parse("boos").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRole);
        assert_eq!(Role::parse(" Client ").unwrap(), Role::Client);
    }

    #[test]
    fn test_role_claim_keeps_unknown_values() {
        assert_eq!(RoleClaim::from_claim("boss"), RoleClaim::Known(Role::Boss));
        let claim = RoleClaim::from_claim("admin");
        assert_eq!(claim, RoleClaim::Unrecognized("admin".to_string()));
        assert_eq!(claim.role(), None);
    }
}
