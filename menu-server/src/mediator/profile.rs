//! User profile requests
//!
//! Same policy engine as content, with the `User` resource. Ownership means
//! the caller is the target user. Listing and role changes are evaluated as
//! non-owner operations, so only the boss passes.

use shared::models::{PasswordChange, ProfileUpdate, Role, User, UserCreate};
use shared::types::UserId;
use shared::{AppError, AppResult};
use tokio_util::sync::CancellationToken;

use super::Mediator;
use crate::auth::CurrentUser;
use crate::auth::policy::{Action, Resource};

#[derive(Debug, Clone)]
pub enum ProfileRequest {
    Get { user_id: UserId },
    Update { user_id: UserId, update: ProfileUpdate },
    ChangePassword { change: PasswordChange },
    List,
    CreateEmployee { payload: UserCreate },
    ChangeRole { user_id: UserId, role: Role },
    Deactivate { user_id: UserId },
}

impl ProfileRequest {
    fn action(&self) -> Action {
        match self {
            ProfileRequest::Get { .. } | ProfileRequest::List => Action::Read,
            ProfileRequest::Update { .. }
            | ProfileRequest::ChangePassword { .. }
            | ProfileRequest::ChangeRole { .. } => Action::Update,
            ProfileRequest::CreateEmployee { .. } => Action::Create,
            ProfileRequest::Deactivate { .. } => Action::Delete,
        }
    }

    fn is_owner(&self, caller: &CurrentUser) -> bool {
        match self {
            ProfileRequest::Get { user_id } | ProfileRequest::Update { user_id, .. } => {
                *user_id == caller.id
            }
            ProfileRequest::ChangePassword { .. } => true,
            ProfileRequest::Deactivate { user_id } => *user_id == caller.id,
            ProfileRequest::List
            | ProfileRequest::CreateEmployee { .. }
            | ProfileRequest::ChangeRole { .. } => false,
        }
    }

    fn target(&self) -> Option<UserId> {
        match self {
            ProfileRequest::Get { user_id }
            | ProfileRequest::Update { user_id, .. }
            | ProfileRequest::ChangeRole { user_id, .. }
            | ProfileRequest::Deactivate { user_id } => Some(*user_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileResponse {
    User(User),
    Users(Vec<User>),
    PasswordChanged,
}

impl Mediator {
    /// Authorize and execute a profile request
    pub fn handle_profile(
        &self,
        caller: Option<&CurrentUser>,
        request: ProfileRequest,
        cancel: &CancellationToken,
    ) -> AppResult<ProfileResponse> {
        Self::check_cancelled(cancel)?;

        let is_owner = caller.is_some_and(|c| request.is_owner(c));
        self.enforce(
            caller,
            Resource::User,
            request.action(),
            is_owner,
            request.target(),
        )?;
        Self::check_cancelled(cancel)?;

        let users = self.users();
        match request {
            ProfileRequest::Get { user_id } => users.get(user_id).map(ProfileResponse::User),
            ProfileRequest::Update { user_id, update } => {
                users.update_profile(user_id, update).map(ProfileResponse::User)
            }
            ProfileRequest::ChangePassword { change } => {
                let caller = caller.ok_or_else(AppError::not_authenticated)?;
                users.change_password(caller.id, change)?;
                Ok(ProfileResponse::PasswordChanged)
            }
            ProfileRequest::List => Ok(ProfileResponse::Users(users.list())),
            ProfileRequest::CreateEmployee { payload } => users
                .register(payload, Role::Employee)
                .map(ProfileResponse::User),
            ProfileRequest::ChangeRole { user_id, role } => {
                users.set_role(user_id, role).map(ProfileResponse::User)
            }
            ProfileRequest::Deactivate { user_id } => {
                users.deactivate(user_id).map(ProfileResponse::User)
            }
        }
    }
}
