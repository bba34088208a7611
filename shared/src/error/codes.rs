//! Unified error codes for the digital menu service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 6xxx: Menu content errors
//! - 8xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Malformed locale code
    InvalidLocale = 9,
    /// Resource was modified by a concurrent writer
    VersionConflict = 10,
    /// Unknown action
    InvalidAction = 11,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Password too short
    PasswordTooShort = 1008,
    /// Password confirmation does not match
    PasswordMismatch = 1009,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Unknown role value
    InvalidRole = 2010,

    // ==================== 6xxx: Menu ====================
    /// Menu entity not found
    EntityNotFound = 6001,
    /// Translation not found
    TranslationNotFound = 6002,
    /// Referenced category or ingredient does not exist
    UnknownReference = 6003,
    /// Product has invalid price
    InvalidPrice = 6004,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// Username already taken
    UsernameExists = 8002,
    /// Email already registered
    EmailExists = 8003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Write lock not acquired within the configured bound
    LockTimeout = 9101,
    /// Request was cancelled before completion
    RequestCancelled = 9102,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether the caller may retry the same request after a backoff
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::VersionConflict | ErrorCode::LockTimeout)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidLocale => "Invalid locale code",
            ErrorCode::VersionConflict => "Resource was modified concurrently",
            ErrorCode::InvalidAction => "Invalid action",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::PasswordMismatch => "Password confirmation does not match",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::InvalidRole => "Invalid role",

            // Menu
            ErrorCode::EntityNotFound => "Menu entity not found",
            ErrorCode::TranslationNotFound => "Translation not found",
            ErrorCode::UnknownReference => "Referenced entity does not exist",
            ErrorCode::InvalidPrice => "Product has invalid price",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::EmailExists => "Email already registered",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::LockTimeout => "Resource is busy, retry later",
            ErrorCode::RequestCancelled => "Request was cancelled",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            9 => Ok(ErrorCode::InvalidLocale),
            10 => Ok(ErrorCode::VersionConflict),
            11 => Ok(ErrorCode::InvalidAction),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::PasswordTooShort),
            1009 => Ok(ErrorCode::PasswordMismatch),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2010 => Ok(ErrorCode::InvalidRole),

            // Menu
            6001 => Ok(ErrorCode::EntityNotFound),
            6002 => Ok(ErrorCode::TranslationNotFound),
            6003 => Ok(ErrorCode::UnknownReference),
            6004 => Ok(ErrorCode::InvalidPrice),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UsernameExists),
            8003 => Ok(ErrorCode::EmailExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9101 => Ok(ErrorCode::LockTimeout),
            9102 => Ok(ErrorCode::RequestCancelled),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::InvalidLocale.code(), 9);
        assert_eq!(ErrorCode::VersionConflict.code(), 10);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::EntityNotFound.code(), 6001);
        assert_eq!(ErrorCode::UserNotFound.code(), 8001);
        assert_eq!(ErrorCode::LockTimeout.code(), 9101);
    }

    #[test]
    fn test_try_from_roundtrips_every_known_code() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::InvalidAction,
            ErrorCode::PasswordMismatch,
            ErrorCode::InvalidRole,
            ErrorCode::InvalidPrice,
            ErrorCode::EmailExists,
            ErrorCode::RequestCancelled,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_unknown_value() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        assert_eq!(ErrorCode::try_from(1), Err(InvalidErrorCode(1)));
    }

    #[test]
    fn test_retryable_codes() {
        assert!(ErrorCode::LockTimeout.is_retryable());
        assert!(ErrorCode::VersionConflict.is_retryable());
        assert!(!ErrorCode::PermissionDenied.is_retryable());
        assert!(!ErrorCode::NotFound.is_retryable());
        assert!(!ErrorCode::InvalidLocale.is_retryable());
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::LockTimeout).unwrap();
        assert_eq!(json, "9101");
        let code: ErrorCode = serde_json::from_str("2001").unwrap();
        assert_eq!(code, ErrorCode::PermissionDenied);
        assert!(serde_json::from_str::<ErrorCode>("77").is_err());
    }
}
