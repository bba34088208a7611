//! JWT Extractor
//!
//! Custom extractors for validating bearer tokens in handlers.
//!
//! - [`CurrentUser`] - authentication required (401 without a valid token)
//! - [`MaybeUser`] - anonymous allowed; a token that is present must be valid

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Optional caller
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn as_ref(&self) -> Option<&CurrentUser> {
        self.0.as_ref()
    }
}

fn authenticate(parts: &mut Parts, state: &ServerState) -> Result<Option<CurrentUser>, AppError> {
    // Check if already extracted
    if let Some(user) = parts.extensions.get::<CurrentUser>() {
        return Ok(Some(user.clone()));
    }

    let Some(auth_header) = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(None);
    };

    let token = JwtService::extract_from_header(auth_header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let claims = state.get_jwt_service().validate_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = format!("{}", e),
            uri = format!("{:?}", parts.uri)
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    let user = CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?;

    // Tokens minted before a role change or deactivation are stale
    match state.users.credential_state(user.id) {
        Some((version, true)) if version == user.credential_version => {}
        _ => {
            security_log!(
                "WARN",
                "credential_revoked",
                user_id = user.id,
                uri = format!("{:?}", parts.uri)
            );
            return Err(AppError::invalid_token("Credentials have been revoked"));
        }
    }

    // Store in extensions for potential reuse
    parts.extensions.insert(user.clone());
    Ok(Some(user))
}

/// Authentication required
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state)? {
            Some(user) => Ok(user),
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                Err(AppError::unauthorized())
            }
        }
    }
}

impl FromRequestParts<ServerState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(MaybeUser)
    }
}
