//! Content record store
//!
//! In-memory store of menu entities and their translation side-table.
//!
//! # Concurrency
//!
//! Each entity lives in its own [`EntitySlot`]:
//!
//! | Part     | Type                    | Role                                   |
//! |----------|-------------------------|----------------------------------------|
//! | `gate`   | `Mutex<()>`             | serializes writers (timed acquisition) |
//! | `record` | `RwLock<Entity>`        | committed state, cloned by readers     |
//! | `deleted`| `AtomicBool`            | set under the gate by `delete_entity`  |
//!
//! Readers never touch the gate, so a slow writer cannot block reads. A
//! writer that queued behind a delete observes `deleted` once it gets the
//! gate and fails with `EntityNotFound`.
//!
//! Product references to categories and ingredients are covered by the
//! store-wide `refs` lock. Creates and attribute updates hold it shared from
//! the reference check until commit; deleting a category or ingredient holds
//! it exclusively from slot removal until every referencing product has been
//! pruned. Lock order is always `refs` before any entity gate.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use shared::models::{Attributes, AttributesPatch, Entity, EntityKind, Translation};
use shared::types::{EntityId, UserId};
use shared::util::{now_millis, snowflake_id};
use shared::{AppError, AppResult, ErrorCode, Locale};
use tokio_util::sync::CancellationToken;

use super::lock;

/// Default bound on waiting for an entity's write gate
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);

pub(crate) fn entity_not_found(id: EntityId) -> AppError {
    AppError::with_message(ErrorCode::EntityNotFound, format!("Entity {} not found", id))
        .with_detail("id", id)
}

#[derive(Debug)]
struct EntitySlot {
    gate: Mutex<()>,
    record: RwLock<Entity>,
    deleted: AtomicBool,
}

impl EntitySlot {
    fn new(entity: Entity) -> Self {
        Self {
            gate: Mutex::new(()),
            record: RwLock::new(entity),
            deleted: AtomicBool::new(false),
        }
    }

    fn snapshot(&self) -> Entity {
        self.record.read().clone()
    }

    fn is_deleted(&self) -> bool {
        self.deleted.load(AtomicOrdering::Acquire)
    }
}

/// Sort key for [`ListQuery::ordering`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Price,
    Stock,
    CreatedAt,
    UpdatedAt,
}

/// Listing filters
///
/// `available`, `category` and `ingredient` only constrain products; other
/// kinds ignore them. `search` matches translation name or description,
/// case-insensitively, in any locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub available: Option<bool>,
    pub category: Option<EntityId>,
    pub ingredient: Option<EntityId>,
    pub search: Option<String>,
    /// `price`, `stock`, `created_at` or `updated_at`; `-` prefix for descending
    pub ordering: Option<String>,
}

impl ListQuery {
    /// Parsed ordering: (key, descending)
    pub fn sort(&self) -> AppResult<(SortKey, bool)> {
        let Some(raw) = self.ordering.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok((SortKey::Id, false));
        };
        let (field, descending) = match raw.strip_prefix('-') {
            Some(field) => (field, true),
            None => (raw, false),
        };
        let key = match field {
            "id" => SortKey::Id,
            "price" => SortKey::Price,
            "stock" => SortKey::Stock,
            "created_at" => SortKey::CreatedAt,
            "updated_at" => SortKey::UpdatedAt,
            _ => {
                return Err(AppError::invalid_request(format!(
                    "Unsupported ordering: {}",
                    raw
                ))
                .with_detail("field", "ordering"));
            }
        };
        Ok((key, descending))
    }

    fn matches(&self, entity: &Entity) -> bool {
        if let Attributes::Product(product) = &entity.attributes {
            if self.available.is_some_and(|a| product.available != a) {
                return false;
            }
            if self.category.is_some_and(|c| !product.categories.contains(&c)) {
                return false;
            }
            if self
                .ingredient
                .is_some_and(|i| !product.ingredients.contains(&i))
            {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                entity.translations.values().any(|t| {
                    t.name.to_lowercase().contains(&term)
                        || t
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&term))
                })
            }
        }
    }
}

fn compare(a: &Entity, b: &Entity, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Id => Ordering::Equal,
        SortKey::Price => match (&a.attributes, &b.attributes) {
            (Attributes::Product(x), Attributes::Product(y)) => x.price.cmp(&y.price),
            _ => Ordering::Equal,
        },
        SortKey::Stock => match (&a.attributes, &b.attributes) {
            (Attributes::Product(x), Attributes::Product(y)) => x.stock.cmp(&y.stock),
            _ => Ordering::Equal,
        },
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Thread-safe entity store
///
/// All write operations block the calling thread while waiting for the
/// entity's gate; async callers should run them on a blocking thread.
#[derive(Debug)]
pub struct ContentStore {
    slots: DashMap<EntityId, Arc<EntitySlot>>,
    refs: RwLock<()>,
    lock_timeout: Duration,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl ContentStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            refs: RwLock::new(()),
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    fn slot(&self, id: EntityId) -> AppResult<Arc<EntitySlot>> {
        self.slots
            .get(&id)
            .map(|slot| slot.value().clone())
            .filter(|slot| !slot.is_deleted())
            .ok_or_else(|| entity_not_found(id))
    }

    fn is_live_reference(&self, kind: EntityKind, id: EntityId) -> bool {
        self.slot(id)
            .map(|slot| slot.record.read().kind == kind)
            .unwrap_or(false)
    }

    /// Every referenced entity must exist and be of the referenced kind
    fn check_references<I>(&self, references: I) -> AppResult<()>
    where
        I: IntoIterator<Item = (EntityKind, EntityId)>,
    {
        for (kind, id) in references {
            if !self.is_live_reference(kind, id) {
                return Err(AppError::with_message(
                    ErrorCode::UnknownReference,
                    format!("Unknown {} reference: {}", kind, id),
                )
                .with_detail("kind", kind.as_str())
                .with_detail("id", id));
            }
        }
        Ok(())
    }

    /// Run `mutate` on a copy of the entity under its write gate and commit
    ///
    /// The committed copy gets `version + 1` and a fresh `updated_at`.
    fn write<F>(&self, id: EntityId, cancel: &CancellationToken, mutate: F) -> AppResult<Entity>
    where
        F: FnOnce(&mut Entity) -> AppResult<()>,
    {
        let slot = self.slot(id)?;
        let _gate = lock::acquire(&slot.gate, self.lock_timeout, cancel).map_err(|e| {
            tracing::warn!(entity_id = id, error = %e, "Entity write gate not acquired");
            e.into_app_error(format!("Entity {}", id))
        })?;

        if slot.is_deleted() {
            return Err(entity_not_found(id));
        }
        if cancel.is_cancelled() {
            return Err(AppError::cancelled());
        }

        let mut next = slot.snapshot();
        mutate(&mut next)?;
        next.version += 1;
        next.updated_at = now_millis();
        *slot.record.write() = next.clone();
        Ok(next)
    }

    /// Insert a new entity owned by `owner`
    pub fn create_entity(
        &self,
        kind: EntityKind,
        owner: Option<UserId>,
        attributes: Attributes,
        translations: BTreeMap<Locale, Translation>,
        cancel: &CancellationToken,
    ) -> AppResult<Entity> {
        if attributes.kind() != kind {
            return Err(AppError::invalid_request(format!(
                "Attributes of {} given for {}",
                attributes.kind(),
                kind
            )));
        }
        attributes.validate()?;
        for translation in translations.values() {
            translation.validate(kind)?;
        }
        let _refs = lock::acquire_read(&self.refs, self.lock_timeout, cancel)
            .map_err(|e| e.into_app_error("Entity references"))?;
        self.check_references(attributes.references())?;

        let now = now_millis();
        let mut entity = Entity {
            id: snowflake_id(),
            kind,
            owner,
            attributes,
            translations,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        // snowflake ids carry 12 random bits per millisecond; retry on collision
        loop {
            match self.slots.entry(entity.id) {
                Entry::Vacant(vacant) => {
                    vacant.insert(Arc::new(EntitySlot::new(entity.clone())));
                    break;
                }
                Entry::Occupied(_) => entity.id = snowflake_id(),
            }
        }

        tracing::debug!(entity_id = entity.id, kind = %kind, "Entity created");
        Ok(entity)
    }

    /// Snapshot of the committed entity
    pub fn get_entity(&self, id: EntityId) -> AppResult<Entity> {
        Ok(self.slot(id)?.snapshot())
    }

    /// Creator of the entity, `None` when missing or unowned
    pub fn owner_of(&self, id: EntityId) -> Option<UserId> {
        self.slot(id).ok().and_then(|slot| slot.record.read().owner)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_ok()
    }

    /// Insert or overwrite the translation for (id, locale)
    pub fn upsert_translation(
        &self,
        id: EntityId,
        locale: Locale,
        translation: Translation,
        cancel: &CancellationToken,
    ) -> AppResult<Entity> {
        self.write(id, cancel, |entity| {
            translation.validate(entity.kind)?;
            entity.translations.insert(locale, translation);
            Ok(())
        })
    }

    pub fn remove_translation(
        &self,
        id: EntityId,
        locale: &Locale,
        cancel: &CancellationToken,
    ) -> AppResult<Entity> {
        self.write(id, cancel, |entity| match entity.translations.remove(locale) {
            Some(_) => Ok(()),
            None => Err(AppError::with_message(
                ErrorCode::TranslationNotFound,
                format!("Translation {} not found", locale),
            )
            .with_detail("locale", locale.as_str())),
        })
    }

    pub fn list_translations(&self, id: EntityId) -> AppResult<BTreeSet<Locale>> {
        let slot = self.slot(id)?;
        let record = slot.record.read();
        Ok(record.translations.keys().cloned().collect())
    }

    /// Apply a partial attribute update
    ///
    /// With `expected_version`, the write only commits if the entity is
    /// still at that version. Only references the patch adds are checked;
    /// references whose target is gone are dropped on commit.
    pub fn update_attributes(
        &self,
        id: EntityId,
        patch: &AttributesPatch,
        expected_version: Option<u64>,
        cancel: &CancellationToken,
    ) -> AppResult<Entity> {
        let _refs = lock::acquire_read(&self.refs, self.lock_timeout, cancel)
            .map_err(|e| e.into_app_error("Entity references"))?;
        self.write(id, cancel, |entity| {
            if let Some(expected) = expected_version
                && expected != entity.version
            {
                return Err(AppError::conflict(format!(
                    "Entity {} is at version {}, expected {}",
                    id, entity.version, expected
                ))
                .with_detail("current_version", entity.version));
            }
            let mut next = patch.apply_to(&entity.attributes)?;
            let current = entity.attributes.references();
            self.check_references(
                next.references()
                    .into_iter()
                    .filter(|reference| !current.contains(reference)),
            )?;
            next.retain_references(|kind, target| self.is_live_reference(kind, target));
            entity.attributes = next;
            Ok(())
        })
    }

    /// Remove an entity together with all its translations
    ///
    /// Products referencing a deleted category or ingredient drop the
    /// reference before this returns. `cancel` is honoured until the slot is
    /// removed; pruning afterwards runs to completion.
    pub fn delete_entity(&self, id: EntityId, cancel: &CancellationToken) -> AppResult<Entity> {
        let kind = self.slot(id)?.record.read().kind;
        let refs_guard = match kind {
            EntityKind::Category | EntityKind::Ingredient => Some(
                lock::acquire_write(&self.refs, self.lock_timeout, cancel)
                    .map_err(|e| e.into_app_error("Entity references"))?,
            ),
            _ => None,
        };

        let removed = {
            let slot = self.slot(id)?;
            let _gate = lock::acquire(&slot.gate, self.lock_timeout, cancel)
                .map_err(|e| e.into_app_error(format!("Entity {}", id)))?;
            if slot.is_deleted() {
                return Err(entity_not_found(id));
            }
            slot.deleted.store(true, AtomicOrdering::Release);
            self.slots.remove(&id);
            slot.snapshot()
        };

        tracing::debug!(entity_id = id, kind = %removed.kind, "Entity deleted");

        if refs_guard.is_some() {
            self.prune_references(removed.kind, id);
        }
        Ok(removed)
    }

    /// Drop `(kind, target)` from every product; caller holds `refs` exclusively
    fn prune_references(&self, kind: EntityKind, target: EntityId) {
        let referencing: Vec<EntityId> = self
            .slots
            .iter()
            .filter(|slot| {
                let record = slot.record.read();
                record.attributes.references().contains(&(kind, target))
            })
            .map(|slot| *slot.key())
            .collect();

        let uncancellable = CancellationToken::new();
        for product_id in referencing {
            loop {
                let result = self.write(product_id, &uncancellable, |entity| {
                    entity
                        .attributes
                        .retain_references(|k, id| (k, id) != (kind, target));
                    Ok(())
                });
                match result {
                    Ok(_) => break,
                    Err(e) if e.code == ErrorCode::EntityNotFound => break,
                    Err(e) => tracing::debug!(
                        product_id,
                        target,
                        error = %e,
                        "Retrying reference prune"
                    ),
                }
            }
        }
    }

    /// Entities of one kind matching `query`
    pub fn list(&self, kind: EntityKind, query: &ListQuery) -> AppResult<Vec<Entity>> {
        let (key, descending) = query.sort()?;
        let slots: Vec<Arc<EntitySlot>> = self.slots.iter().map(|s| s.value().clone()).collect();

        let mut entities: Vec<Entity> = slots
            .iter()
            .filter(|slot| !slot.is_deleted())
            .map(|slot| slot.snapshot())
            .filter(|entity| entity.kind == kind && query.matches(entity))
            .collect();

        entities.sort_by(|a, b| {
            let ord = compare(a, b, key);
            if descending { ord.reverse() } else { ord }
        });
        Ok(entities)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
