//! Role policy engine
//!
//! Closed RBAC matrix over (role, resource, action, ownership).
//!
//! | Caller          | Product / Category / Ingredient          | Company | User                 |
//! |-----------------|------------------------------------------|---------|----------------------|
//! | Boss            | all                                      | all     | all                  |
//! | Employee        | Read, Create, Update; Delete only if owner| Read    | Read/Update own      |
//! | Client          | Read                                     | Read    | Read/Update own      |
//! | Unauthenticated | Read                                     | Read    | none                 |
//! | Unknown role    | none                                     | none    | none                 |
//!
//! [`authorize`] is a pure function: no I/O, no shared state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared::models::{EntityKind, Role, RoleClaim};
use shared::{AppError, ErrorCode};

/// Protected resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Product,
    Category,
    Ingredient,
    Company,
    User,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Product,
        Resource::Category,
        Resource::Ingredient,
        Resource::Company,
        Resource::User,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Resource::Product => "product",
            Resource::Category => "category",
            Resource::Ingredient => "ingredient",
            Resource::Company => "company",
            Resource::User => "user",
        }
    }

    fn is_menu_content(&self) -> bool {
        matches!(
            self,
            Resource::Product | Resource::Category | Resource::Ingredient
        )
    }
}

impl From<EntityKind> for Resource {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Product => Resource::Product,
            EntityKind::Category => Resource::Category,
            EntityKind::Ingredient => Resource::Ingredient,
            EntityKind::Company => Resource::Company,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Update, Action::Delete];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Action::Read)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(AppError::with_message(
                ErrorCode::InvalidAction,
                format!("Unknown action: {}", s),
            )),
        }
    }
}

/// Policy outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}

/// Decide whether `role` may perform `action` on `resource`
///
/// `role` is `None` for unauthenticated callers. `is_owner` is true when the
/// caller created the target entity, or is the target user.
pub fn authorize(
    role: Option<&RoleClaim>,
    resource: Resource,
    action: Action,
    is_owner: bool,
) -> Decision {
    let role = match role {
        None => return anonymous(resource, action),
        Some(RoleClaim::Known(role)) => *role,
        Some(RoleClaim::Unrecognized(_)) => return Decision::Deny,
    };

    match role {
        Role::Boss => Decision::Allow,
        Role::Employee => employee(resource, action, is_owner),
        Role::Client => client(resource, action, is_owner),
    }
}

fn anonymous(resource: Resource, action: Action) -> Decision {
    (resource != Resource::User && action == Action::Read).into()
}

fn employee(resource: Resource, action: Action, is_owner: bool) -> Decision {
    match resource {
        r if r.is_menu_content() => match action {
            Action::Read | Action::Create | Action::Update => Decision::Allow,
            Action::Delete => is_owner.into(),
        },
        Resource::Company => (action == Action::Read).into(),
        _ => own_profile(action, is_owner),
    }
}

fn client(resource: Resource, action: Action, is_owner: bool) -> Decision {
    match resource {
        Resource::User => own_profile(action, is_owner),
        _ => (action == Action::Read).into(),
    }
}

fn own_profile(action: Action, is_owner: bool) -> Decision {
    (is_owner && matches!(action, Action::Read | Action::Update)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(role: Role) -> RoleClaim {
        RoleClaim::Known(role)
    }

    #[test]
    fn test_boss_allowed_everything() {
        let boss = known(Role::Boss);
        for resource in Resource::ALL {
            for action in Action::ALL {
                for owner in [true, false] {
                    assert_eq!(
                        authorize(Some(&boss), resource, action, owner),
                        Decision::Allow,
                        "boss {resource} {action} owner={owner}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_unauthenticated_read_only() {
        assert!(authorize(None, Resource::Product, Action::Read, false).is_allowed());
        assert!(authorize(None, Resource::Company, Action::Read, false).is_allowed());
        assert!(!authorize(None, Resource::Product, Action::Delete, false).is_allowed());
        assert!(!authorize(None, Resource::Product, Action::Create, false).is_allowed());
        assert!(!authorize(None, Resource::User, Action::Read, true).is_allowed());
    }

    #[test]
    fn test_employee_delete_requires_ownership() {
        let employee = known(Role::Employee);
        for resource in [Resource::Product, Resource::Category, Resource::Ingredient] {
            assert!(authorize(Some(&employee), resource, Action::Create, false).is_allowed());
            assert!(authorize(Some(&employee), resource, Action::Update, false).is_allowed());
            assert!(authorize(Some(&employee), resource, Action::Delete, true).is_allowed());
            assert!(!authorize(Some(&employee), resource, Action::Delete, false).is_allowed());
        }
    }

    #[test]
    fn test_employee_company_is_read_only() {
        let employee = known(Role::Employee);
        assert!(authorize(Some(&employee), Resource::Company, Action::Read, false).is_allowed());
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(!authorize(Some(&employee), Resource::Company, action, true).is_allowed());
        }
    }

    #[test]
    fn test_client_read_only_content() {
        let client = known(Role::Client);
        assert!(authorize(Some(&client), Resource::Ingredient, Action::Read, false).is_allowed());
        assert!(!authorize(Some(&client), Resource::Product, Action::Update, true).is_allowed());
        assert!(!authorize(Some(&client), Resource::Company, Action::Update, false).is_allowed());
    }

    #[test]
    fn test_own_profile_rules() {
        for role in [Role::Client, Role::Employee] {
            let claim = known(role);
            assert!(authorize(Some(&claim), Resource::User, Action::Read, true).is_allowed());
            assert!(authorize(Some(&claim), Resource::User, Action::Update, true).is_allowed());
            assert!(!authorize(Some(&claim), Resource::User, Action::Read, false).is_allowed());
            assert!(!authorize(Some(&claim), Resource::User, Action::Delete, true).is_allowed());
            assert!(!authorize(Some(&claim), Resource::User, Action::Create, false).is_allowed());
        }
    }

    #[test]
    fn test_unknown_role_fails_closed() {
        let unknown = RoleClaim::Unrecognized("superuser".into());
        for resource in Resource::ALL {
            for action in Action::ALL {
                assert_eq!(
                    authorize(Some(&unknown), resource, action, true),
                    Decision::Deny
                );
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let employee = known(Role::Employee);
        let first = authorize(Some(&employee), Resource::Product, Action::Delete, false);
        for _ in 0..100 {
            assert_eq!(
                authorize(Some(&employee), Resource::Product, Action::Delete, false),
                first
            );
        }
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("Delete".parse::<Action>().unwrap(), Action::Delete);
        let err = "purge".parse::<Action>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAction);
    }
}
