//! Account administration routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/employe | POST | boss |
//! | /api/users-list | GET | boss |
//! | /api/users/{id} | GET | boss or self |
//! | /api/users/{id}/role | PATCH | boss |
//! | /api/users/{id}/deactivate | POST | boss |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use shared::models::{Role, RoleChange, User, UserCreate};
use shared::types::UserId;
use shared::{ApiResponse, AppError, AppResult};

use crate::api::run_blocking;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::mediator::{ProfileRequest, ProfileResponse};
use crate::security_log;
use crate::utils::ok;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/employe", post(create_employee))
        .route("/api/users-list", get(list))
        .route("/api/users/{id}", get(get_by_id))
        .route("/api/users/{id}/role", patch(change_role))
        .route("/api/users/{id}/deactivate", post(deactivate))
}

pub(crate) fn expect_user(response: ProfileResponse) -> AppResult<User> {
    match response {
        ProfileResponse::User(user) => Ok(user),
        other => Err(AppError::internal(format!(
            "Unexpected profile response: {:?}",
            other
        ))),
    }
}

/// Run a profile request through the mediator
pub(crate) async fn dispatch(
    state: &ServerState,
    caller: CurrentUser,
    request: ProfileRequest,
) -> AppResult<ProfileResponse> {
    let mediator = state.mediator.clone();
    run_blocking(state, move |cancel| {
        mediator.handle_profile(Some(&caller), request, cancel)
    })
    .await
}

/// POST /api/employe - boss creates an employee account
async fn create_employee(
    State(state): State<ServerState>,
    caller: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = expect_user(dispatch(&state, caller, ProfileRequest::CreateEmployee { payload }).await?)?;
    tracing::info!(user_id = user.id, username = %user.username, "Employee created");
    Ok(ok(user))
}

/// GET /api/users-list
async fn list(
    State(state): State<ServerState>,
    caller: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    match dispatch(&state, caller, ProfileRequest::List).await? {
        ProfileResponse::Users(users) => Ok(ok(users)),
        other => Err(AppError::internal(format!(
            "Unexpected profile response: {:?}",
            other
        ))),
    }
}

/// GET /api/users/{id}
async fn get_by_id(
    State(state): State<ServerState>,
    caller: CurrentUser,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = expect_user(dispatch(&state, caller, ProfileRequest::Get { user_id }).await?)?;
    Ok(ok(user))
}

/// PATCH /api/users/{id}/role
async fn change_role(
    State(state): State<ServerState>,
    caller: CurrentUser,
    Path(user_id): Path<UserId>,
    Json(payload): Json<RoleChange>,
) -> AppResult<Json<ApiResponse<User>>> {
    let role = Role::parse(&payload.role)?;
    let operator = caller.id;
    let user = expect_user(dispatch(&state, caller, ProfileRequest::ChangeRole { user_id, role }).await?)?;
    security_log!(
        "INFO",
        "role_changed",
        operator = operator,
        user_id = user_id,
        role = role.as_str()
    );
    Ok(ok(user))
}

/// POST /api/users/{id}/deactivate
async fn deactivate(
    State(state): State<ServerState>,
    caller: CurrentUser,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<ApiResponse<User>>> {
    let operator = caller.id;
    let user = expect_user(dispatch(&state, caller, ProfileRequest::Deactivate { user_id }).await?)?;
    security_log!(
        "INFO",
        "user_deactivated",
        operator = operator,
        user_id = user_id
    );
    Ok(ok(user))
}
