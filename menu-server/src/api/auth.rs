//! Authentication and own-profile routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/token | POST | none |
//! | /api/clients | POST | none |
//! | /api/me | GET, PATCH | token |
//! | /api/change-password | POST | token |

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use shared::models::{PasswordChange, ProfileUpdate, Role, User, UserCreate};
use shared::{ApiResponse, AppError, AppResult};

use crate::api::run_blocking;
use crate::api::users::{dispatch as profile, expect_user};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::mediator::{ProfileRequest, ProfileResponse};
use crate::security_log;
use crate::utils::{ok, ok_with_message};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/token", post(login))
        .route("/api/clients", post(register_client))
        .route("/api/me", get(me).patch(update_me))
        .route("/api/change-password", post(change_password))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds
    pub expires_in: i64,
    pub user: User,
}

/// POST /api/token - exchange credentials for a bearer token
async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let users = state.users.clone();
    let username = payload.username.clone();
    let result = run_blocking(&state, move |_| {
        users.authenticate(&payload.username, &payload.password)
    })
    .await;

    let user = match result {
        Ok(user) => user,
        Err(e) => {
            security_log!(
                "WARN",
                "login_failed",
                username = username,
                error = e.message.clone()
            );
            return Err(e);
        }
    };

    let token = state
        .get_jwt_service()
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;

    tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User logged in");

    Ok(ok(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt_service.config.expiration_minutes * 60,
        user,
    }))
}

/// POST /api/clients - self-registration, always as a client
async fn register_client(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<ApiResponse<User>>> {
    let users = state.users.clone();
    let user = run_blocking(&state, move |_| users.register(payload, Role::Client)).await?;
    tracing::info!(user_id = user.id, username = %user.username, "Client registered");
    Ok(ok(user))
}

/// GET /api/me
async fn me(
    State(state): State<ServerState>,
    caller: CurrentUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let request = ProfileRequest::Get { user_id: caller.id };
    let user = expect_user(profile(&state, caller, request).await?)?;
    Ok(ok(user))
}

/// PATCH /api/me
async fn update_me(
    State(state): State<ServerState>,
    caller: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<ApiResponse<User>>> {
    let request = ProfileRequest::Update {
        user_id: caller.id,
        update,
    };
    let user = expect_user(profile(&state, caller, request).await?)?;
    Ok(ok(user))
}

/// POST /api/change-password
async fn change_password(
    State(state): State<ServerState>,
    caller: CurrentUser,
    Json(change): Json<PasswordChange>,
) -> AppResult<Json<ApiResponse<()>>> {
    let user_id = caller.id;
    match profile(&state, caller, ProfileRequest::ChangePassword { change }).await? {
        ProfileResponse::PasswordChanged => {
            security_log!("INFO", "password_changed", user_id = user_id);
            Ok(ok_with_message((), "Password changed"))
        }
        other => Err(AppError::internal(format!(
            "Unexpected profile response: {:?}",
            other
        ))),
    }
}
