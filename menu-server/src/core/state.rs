use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::i18n::LocaleResolver;
use crate::mediator::Mediator;
use crate::store::{ContentStore, UserDirectory};

/// Server state - shared handles to every service
///
/// Cloning is cheap: every field is behind an `Arc`.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | config | Config | immutable settings |
/// | jwt_service | Arc<JwtService> | token issue and validation |
/// | users | Arc<UserDirectory> | accounts and credentials |
/// | content | Arc<ContentStore> | menu entities and translations |
/// | mediator | Arc<Mediator> | authorization and resolution entry point |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub jwt_service: Arc<JwtService>,
    pub users: Arc<UserDirectory>,
    pub content: Arc<ContentStore>,
    pub mediator: Arc<Mediator>,
}

impl ServerState {
    /// Wire up all services and create the bootstrap boss account
    pub fn initialize(config: &Config) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let users = Arc::new(UserDirectory::new());
        let content = Arc::new(ContentStore::new(config.lock_timeout()));
        let mediator = Arc::new(Mediator::new(
            content.clone(),
            users.clone(),
            LocaleResolver::new(config.resolver_config()),
            config.mediator_config(),
        ));

        if let Some(boss) = &config.boss {
            match users.ensure_boss(&boss.username, &boss.email, &boss.password)? {
                Some(user) => tracing::info!(user_id = user.id, username = %user.username, "Boss account created"),
                None => tracing::debug!(username = %boss.username, "Boss account already present"),
            }
        } else {
            tracing::warn!("No BOSS_USERNAME/BOSS_EMAIL/BOSS_PASSWORD set; no boss account available");
        }

        Ok(Self {
            config: config.clone(),
            jwt_service,
            users,
            content,
            mediator,
        })
    }

    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}
