//! Request mediator
//!
//! Single entry point for content and profile requests:
//!
//! 1. work out whether the caller owns the target
//! 2. ask the policy engine; a denial stops here
//! 3. reads go through the locale resolver
//! 4. writes go to the store, the creator becomes owner
//!
//! A cancelled request stops before the next step. Store writes observe the
//! same token while waiting for an entity gate, so no lock outlives the
//! request.

mod profile;

pub use profile::{ProfileRequest, ProfileResponse};

use std::sync::Arc;

use serde::Serialize;
use shared::models::{
    Attributes, AttributesPatch, Entity, EntityDraft, EntityKind, Translation,
};
use shared::types::{EntityId, Timestamp, UserId};
use shared::{AppError, AppResult, Locale};
use tokio_util::sync::CancellationToken;

use crate::auth::policy::{Action, Decision, Resource, authorize};
use crate::auth::CurrentUser;
use crate::i18n::{LocaleResolver, MatchKind, Resolution};
use crate::security_log;
use crate::store::content::entity_not_found;
use crate::store::{ContentStore, ListQuery, UserDirectory};

/// Mediator settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediatorConfig {
    /// Report denials on a specific id as not-found instead of forbidden
    pub hide_existence: bool,
}

/// Content operation on one entity kind
#[derive(Debug, Clone)]
pub enum ContentRequest {
    List {
        kind: EntityKind,
        query: ListQuery,
        locale: Option<String>,
    },
    Get {
        kind: EntityKind,
        id: EntityId,
        locale: Option<String>,
    },
    Create {
        kind: EntityKind,
        draft: EntityDraft,
    },
    Update {
        kind: EntityKind,
        id: EntityId,
        patch: AttributesPatch,
        expected_version: Option<u64>,
    },
    Delete {
        kind: EntityKind,
        id: EntityId,
    },
    ListTranslations {
        kind: EntityKind,
        id: EntityId,
    },
    UpsertTranslation {
        kind: EntityKind,
        id: EntityId,
        locale: Locale,
        translation: Translation,
    },
    RemoveTranslation {
        kind: EntityKind,
        id: EntityId,
        locale: Locale,
    },
}

impl ContentRequest {
    pub fn kind(&self) -> EntityKind {
        match self {
            ContentRequest::List { kind, .. }
            | ContentRequest::Get { kind, .. }
            | ContentRequest::Create { kind, .. }
            | ContentRequest::Update { kind, .. }
            | ContentRequest::Delete { kind, .. }
            | ContentRequest::ListTranslations { kind, .. }
            | ContentRequest::UpsertTranslation { kind, .. }
            | ContentRequest::RemoveTranslation { kind, .. } => *kind,
        }
    }

    /// Action checked against the policy
    ///
    /// Translation writes count as updates of the parent entity.
    pub fn action(&self) -> Action {
        match self {
            ContentRequest::List { .. }
            | ContentRequest::Get { .. }
            | ContentRequest::ListTranslations { .. } => Action::Read,
            ContentRequest::Create { .. } => Action::Create,
            ContentRequest::Update { .. }
            | ContentRequest::UpsertTranslation { .. }
            | ContentRequest::RemoveTranslation { .. } => Action::Update,
            ContentRequest::Delete { .. } => Action::Delete,
        }
    }

    pub fn target(&self) -> Option<EntityId> {
        match self {
            ContentRequest::List { .. } | ContentRequest::Create { .. } => None,
            ContentRequest::Get { id, .. }
            | ContentRequest::Update { id, .. }
            | ContentRequest::Delete { id, .. }
            | ContentRequest::ListTranslations { id, .. }
            | ContentRequest::UpsertTranslation { id, .. }
            | ContentRequest::RemoveTranslation { id, .. } => Some(*id),
        }
    }
}

/// Entity fields plus the translation chosen for the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContent {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: Option<UserId>,
    pub attributes: Attributes,
    /// Locale actually served; `None` when untranslated
    pub locale: Option<Locale>,
    pub matched: Option<MatchKind>,
    pub translated: bool,
    pub name: Option<String>,
    pub description: Option<String>,
    pub available_locales: Vec<Locale>,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ResolvedContent {
    fn new(entity: &Entity, resolution: Resolution<'_, Translation>) -> Self {
        let (locale, matched, name, description) = match resolution {
            Resolution::Resolved {
                locale,
                value,
                matched,
            } => (
                Some(locale),
                Some(matched),
                Some(value.name.clone()),
                value.description.clone(),
            ),
            Resolution::Untranslated { .. } => (None, None, None, None),
        };
        Self {
            id: entity.id,
            kind: entity.kind,
            owner: entity.owner,
            attributes: entity.attributes.clone(),
            translated: locale.is_some(),
            locale,
            matched,
            name,
            description,
            available_locales: entity.locales(),
            version: entity.version,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Mediator outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentResponse {
    Resolved(ResolvedContent),
    List(Vec<ResolvedContent>),
    /// Committed entity after a create or write
    Written(Entity),
    Deleted { id: EntityId, deleted: bool },
    Locales(Vec<Locale>),
}

/// Ties policy, resolver and stores together
#[derive(Debug, Clone)]
pub struct Mediator {
    content: Arc<ContentStore>,
    users: Arc<UserDirectory>,
    resolver: LocaleResolver,
    config: MediatorConfig,
}

impl Mediator {
    pub fn new(
        content: Arc<ContentStore>,
        users: Arc<UserDirectory>,
        resolver: LocaleResolver,
        config: MediatorConfig,
    ) -> Self {
        Self {
            content,
            users,
            resolver,
            config,
        }
    }

    pub fn content(&self) -> &Arc<ContentStore> {
        &self.content
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    fn check_cancelled(cancel: &CancellationToken) -> AppResult<()> {
        if cancel.is_cancelled() {
            return Err(AppError::cancelled());
        }
        Ok(())
    }

    /// Entity of the requested kind, or `EntityNotFound`
    fn entity_of(&self, kind: EntityKind, id: EntityId) -> AppResult<Entity> {
        let entity = self.content.get_entity(id)?;
        if entity.kind != kind {
            return Err(entity_not_found(id));
        }
        Ok(entity)
    }

    /// Policy check with the configured denial shape
    pub(crate) fn enforce(
        &self,
        caller: Option<&CurrentUser>,
        resource: Resource,
        action: Action,
        is_owner: bool,
        target: Option<EntityId>,
    ) -> AppResult<()> {
        let decision = authorize(caller.map(|c| &c.role), resource, action, is_owner);
        if decision == Decision::Allow {
            return Ok(());
        }

        let who = caller
            .map(|c| format!("{}:{}", c.id, c.role))
            .unwrap_or_else(|| "anonymous".to_string());
        security_log!(
            "WARN",
            "permission_denied",
            caller = who,
            resource = resource.as_str(),
            action = action.as_str(),
            target = format!("{:?}", target)
        );

        match target {
            Some(id) if self.config.hide_existence => Err(AppError::not_found(format!(
                "{} {}",
                resource.as_str(),
                id
            ))),
            _ => Err(AppError::forbidden(format!(
                "Not allowed to {} {}",
                action, resource
            ))),
        }
    }

    /// Authorize and execute a content request
    pub fn handle(
        &self,
        caller: Option<&CurrentUser>,
        request: ContentRequest,
        cancel: &CancellationToken,
    ) -> AppResult<ContentResponse> {
        Self::check_cancelled(cancel)?;

        let kind = request.kind();
        let action = request.action();
        let target = request.target();

        let is_owner = match (caller, target) {
            (Some(caller), Some(id)) => self
                .content
                .get_entity(id)
                .ok()
                .filter(|e| e.kind == kind)
                .and_then(|e| e.owner)
                .is_some_and(|owner| owner == caller.id),
            _ => false,
        };

        self.enforce(caller, kind.into(), action, is_owner, target)?;
        Self::check_cancelled(cancel)?;

        tracing::debug!(
            kind = %kind,
            action = %action,
            target = ?target,
            user_id = ?caller.map(|c| c.id),
            "Content request authorized"
        );

        match request {
            ContentRequest::List { kind, query, locale } => {
                let entities = self.content.list(kind, &query)?;
                let resolved = entities
                    .into_iter()
                    .map(|entity| self.resolve(entity, locale.as_deref()))
                    .collect();
                Ok(ContentResponse::List(resolved))
            }
            ContentRequest::Get { kind, id, locale } => {
                let entity = self.entity_of(kind, id)?;
                Ok(ContentResponse::Resolved(
                    self.resolve(entity, locale.as_deref()),
                ))
            }
            ContentRequest::Create { kind, draft } => {
                draft.validate()?;
                let owner = caller.map(|c| c.id);
                let entity = self.content.create_entity(
                    kind,
                    owner,
                    draft.attributes,
                    draft.translations,
                    cancel,
                )?;
                tracing::info!(entity_id = entity.id, kind = %kind, owner = ?owner, "Entity created");
                Ok(ContentResponse::Written(entity))
            }
            ContentRequest::Update {
                kind,
                id,
                patch,
                expected_version,
            } => {
                self.entity_of(kind, id)?;
                let entity = self
                    .content
                    .update_attributes(id, &patch, expected_version, cancel)?;
                tracing::info!(entity_id = id, version = entity.version, "Entity updated");
                Ok(ContentResponse::Written(entity))
            }
            ContentRequest::Delete { kind, id } => {
                self.entity_of(kind, id)?;
                self.content.delete_entity(id, cancel)?;
                tracing::info!(entity_id = id, kind = %kind, "Entity deleted");
                Ok(ContentResponse::Deleted { id, deleted: true })
            }
            ContentRequest::ListTranslations { kind, id } => {
                self.entity_of(kind, id)?;
                let locales = self.content.list_translations(id)?;
                Ok(ContentResponse::Locales(locales.into_iter().collect()))
            }
            ContentRequest::UpsertTranslation {
                kind,
                id,
                locale,
                translation,
            } => {
                self.entity_of(kind, id)?;
                let entity = self
                    .content
                    .upsert_translation(id, locale, translation, cancel)?;
                Ok(ContentResponse::Written(entity))
            }
            ContentRequest::RemoveTranslation { kind, id, locale } => {
                self.entity_of(kind, id)?;
                let entity = self.content.remove_translation(id, &locale, cancel)?;
                Ok(ContentResponse::Written(entity))
            }
        }
    }

    fn resolve(&self, entity: Entity, requested: Option<&str>) -> ResolvedContent {
        let resolution = self
            .resolver
            .resolve(entity.id, requested, &entity.translations);
        ResolvedContent::new(&entity, resolution)
    }
}
