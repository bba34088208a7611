//! User directory
//!
//! Accounts with argon2 password hashes. Users are never removed, only
//! deactivated. Role changes and deactivation bump `credential_version`,
//! which invalidates every token minted before the change.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared::models::{PasswordChange, ProfileUpdate, Role, User, UserCreate, looks_like_email};
use shared::types::UserId;
use shared::util::{now_millis, snowflake_id};
use shared::{AppError, AppResult, ErrorCode};

use crate::auth::password::{check_password_strength, hash_password, verify_password};

const USERNAME_MAX_LEN: usize = 150;

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

fn user_not_found(id: UserId) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {} not found", id))
        .with_detail("id", id)
}

fn validate_email(email: &str) -> AppResult<()> {
    if looks_like_email(email) {
        Ok(())
    } else {
        Err(AppError::validation("Invalid email").with_detail("field", "email"))
    }
}

/// In-memory account store
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with the given role
    pub fn register(&self, payload: UserCreate, role: Role) -> AppResult<User> {
        let username = payload.username.trim().to_string();
        if username.is_empty() || username.chars().count() > USERNAME_MAX_LEN {
            return Err(AppError::validation(format!(
                "Username must be 1 to {} characters",
                USERNAME_MAX_LEN
            ))
            .with_detail("field", "username"));
        }
        let email = payload.email.trim().to_string();
        validate_email(&email)?;
        check_password_strength(&payload.password)?;

        // hash outside the lock, argon2 is deliberately slow
        let password_hash = hash_password(&payload.password)?;

        let mut users = self.users.write();
        if users
            .values()
            .any(|r| r.user.username.eq_ignore_ascii_case(&username))
        {
            return Err(AppError::with_message(
                ErrorCode::UsernameExists,
                format!("Username {} is taken", username),
            ));
        }
        if users
            .values()
            .any(|r| r.user.email.eq_ignore_ascii_case(&email))
        {
            return Err(AppError::new(ErrorCode::EmailExists));
        }

        let mut id = snowflake_id();
        while users.contains_key(&id) {
            id = snowflake_id();
        }
        let now = now_millis();
        let user = User {
            id,
            username,
            name: payload.name.trim().to_string(),
            email,
            role,
            is_active: true,
            address: None,
            location: None,
            province: None,
            phone: None,
            credential_version: 1,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            id,
            UserRecord {
                user: user.clone(),
                password_hash,
            },
        );

        tracing::info!(user_id = id, username = %user.username, role = %role, "User registered");
        Ok(user)
    }

    /// Verify credentials and return the account
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let record = self
            .users
            .read()
            .values()
            .find(|r| r.user.username.eq_ignore_ascii_case(username.trim()))
            .cloned()
            .ok_or_else(AppError::invalid_credentials)?;

        if !verify_password(password, &record.password_hash)? {
            return Err(AppError::invalid_credentials());
        }
        if !record.user.is_active {
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }
        Ok(record.user)
    }

    pub fn get(&self, id: UserId) -> AppResult<User> {
        self.users
            .read()
            .get(&id)
            .map(|r| r.user.clone())
            .ok_or_else(|| user_not_found(id))
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .values()
            .find(|r| r.user.username.eq_ignore_ascii_case(username))
            .map(|r| r.user.clone())
    }

    /// All accounts, oldest first
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().values().map(|r| r.user.clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn update_profile(&self, id: UserId, update: ProfileUpdate) -> AppResult<User> {
        let mut users = self.users.write();

        if let Some(email) = &update.email {
            validate_email(email.trim())?;
            if users
                .values()
                .any(|r| r.user.id != id && r.user.email.eq_ignore_ascii_case(email.trim()))
            {
                return Err(AppError::new(ErrorCode::EmailExists));
            }
        }

        let record = users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        let user = &mut record.user;
        if let Some(name) = update.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            user.email = email.trim().to_string();
        }
        if update.address.is_some() {
            user.address = update.address;
        }
        if update.location.is_some() {
            user.location = update.location;
        }
        if update.province.is_some() {
            user.province = update.province;
        }
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        user.updated_at = now_millis();
        Ok(user.clone())
    }

    pub fn change_password(&self, id: UserId, change: PasswordChange) -> AppResult<()> {
        if change.new_password != change.confirm_password {
            return Err(AppError::new(ErrorCode::PasswordMismatch));
        }
        check_password_strength(&change.new_password)?;

        let current_hash = self
            .users
            .read()
            .get(&id)
            .map(|r| r.password_hash.clone())
            .ok_or_else(|| user_not_found(id))?;
        if !verify_password(&change.old_password, &current_hash)? {
            return Err(AppError::with_message(
                ErrorCode::InvalidCredentials,
                "Current password is incorrect",
            ));
        }
        let new_hash = hash_password(&change.new_password)?;

        let mut users = self.users.write();
        let record = users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        record.password_hash = new_hash;
        record.user.updated_at = now_millis();
        tracing::info!(user_id = id, "Password changed");
        Ok(())
    }

    /// Change a user's role; outstanding tokens stop working
    pub fn set_role(&self, id: UserId, role: Role) -> AppResult<User> {
        let mut users = self.users.write();
        let user = &mut users.get_mut(&id).ok_or_else(|| user_not_found(id))?.user;
        if user.role != role {
            user.role = role;
            user.credential_version += 1;
            user.updated_at = now_millis();
            tracing::info!(user_id = id, role = %role, "User role changed");
        }
        Ok(user.clone())
    }

    /// Disable an account; outstanding tokens stop working
    pub fn deactivate(&self, id: UserId) -> AppResult<User> {
        let mut users = self.users.write();
        let user = &mut users.get_mut(&id).ok_or_else(|| user_not_found(id))?.user;
        if user.is_active {
            user.is_active = false;
            user.credential_version += 1;
            user.updated_at = now_millis();
            tracing::info!(user_id = id, "User deactivated");
        }
        Ok(user.clone())
    }

    /// `(credential_version, is_active)` used to vet incoming tokens
    pub fn credential_state(&self, id: UserId) -> Option<(u64, bool)> {
        self.users
            .read()
            .get(&id)
            .map(|r| (r.user.credential_version, r.user.is_active))
    }

    /// Create the bootstrap Boss account unless the username exists
    pub fn ensure_boss(&self, username: &str, email: &str, password: &str) -> AppResult<Option<User>> {
        if self.find_by_username(username).is_some() {
            return Ok(None);
        }
        let boss = self.register(
            UserCreate {
                username: username.to_string(),
                name: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            },
            Role::Boss,
        )?;
        Ok(Some(boss))
    }
}
