//! Menu entity model
//!
//! Products, categories, ingredients and the company record share one
//! envelope: immutable id, kind, optional owner, kind-specific attributes
//! that are never translated, and a per-locale translation side-table.

use super::{
    CategoryAttributes, CategoryPatch, CompanyAttributes, CompanyPatch, IngredientAttributes,
    IngredientPatch, ProductAttributes, ProductPatch, Translation,
};
use crate::error::{AppError, AppResult};
use crate::locale::Locale;
use crate::types::{EntityId, Timestamp, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Menu entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Category,
    Ingredient,
    Company,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Product,
        EntityKind::Category,
        EntityKind::Ingredient,
        EntityKind::Company,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Category => "category",
            EntityKind::Ingredient => "ingredient",
            EntityKind::Company => "company",
        }
    }

    /// URL segment under `/api`
    pub const fn segment(&self) -> &'static str {
        match self {
            EntityKind::Product => "products",
            EntityKind::Category => "categories",
            EntityKind::Ingredient => "ingredients",
            EntityKind::Company => "company",
        }
    }

    /// Maximum length of a translated name
    pub const fn name_max_len(&self) -> usize {
        match self {
            EntityKind::Ingredient => 50,
            _ => 100,
        }
    }

    /// Maximum length of a translated description, if bounded
    ///
    /// The company record keeps its address in the description slot.
    pub const fn description_max_len(&self) -> Option<usize> {
        match self {
            EntityKind::Company => Some(200),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_for<T: DeserializeOwned>(kind: EntityKind, value: Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::validation(format!("Invalid {} attributes: {}", kind, e)))
}

/// Non-translated attributes, one shape per kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Attributes {
    Product(ProductAttributes),
    Category(CategoryAttributes),
    Ingredient(IngredientAttributes),
    Company(CompanyAttributes),
}

impl Attributes {
    pub fn kind(&self) -> EntityKind {
        match self {
            Attributes::Product(_) => EntityKind::Product,
            Attributes::Category(_) => EntityKind::Category,
            Attributes::Ingredient(_) => EntityKind::Ingredient,
            Attributes::Company(_) => EntityKind::Company,
        }
    }

    /// Decode attributes for a kind known from the route
    pub fn from_json(kind: EntityKind, value: Value) -> AppResult<Self> {
        Ok(match kind {
            EntityKind::Product => Attributes::Product(parse_for(kind, value)?),
            EntityKind::Category => Attributes::Category(parse_for(kind, value)?),
            EntityKind::Ingredient => Attributes::Ingredient(parse_for(kind, value)?),
            EntityKind::Company => Attributes::Company(parse_for(kind, value)?),
        })
    }

    pub fn validate(&self) -> AppResult<()> {
        match self {
            Attributes::Product(p) => p.validate(),
            Attributes::Category(c) => c.validate(),
            Attributes::Ingredient(i) => i.validate(),
            Attributes::Company(c) => c.validate(),
        }
    }

    /// Other entities these attributes point at
    pub fn references(&self) -> Vec<(EntityKind, EntityId)> {
        match self {
            Attributes::Product(p) => p
                .categories
                .iter()
                .map(|id| (EntityKind::Category, *id))
                .chain(p.ingredients.iter().map(|id| (EntityKind::Ingredient, *id)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Keep only the references for which `keep` returns true
    pub fn retain_references<F>(&mut self, mut keep: F)
    where
        F: FnMut(EntityKind, EntityId) -> bool,
    {
        if let Attributes::Product(p) = self {
            p.categories.retain(|id| keep(EntityKind::Category, *id));
            p.ingredients.retain(|id| keep(EntityKind::Ingredient, *id));
        }
    }
}

/// Partial attribute update
#[derive(Debug, Clone, PartialEq)]
pub enum AttributesPatch {
    Product(ProductPatch),
    Category(CategoryPatch),
    Ingredient(IngredientPatch),
    Company(CompanyPatch),
}

impl AttributesPatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            AttributesPatch::Product(_) => EntityKind::Product,
            AttributesPatch::Category(_) => EntityKind::Category,
            AttributesPatch::Ingredient(_) => EntityKind::Ingredient,
            AttributesPatch::Company(_) => EntityKind::Company,
        }
    }

    pub fn from_json(kind: EntityKind, value: Value) -> AppResult<Self> {
        Ok(match kind {
            EntityKind::Product => AttributesPatch::Product(parse_for(kind, value)?),
            EntityKind::Category => AttributesPatch::Category(parse_for(kind, value)?),
            EntityKind::Ingredient => AttributesPatch::Ingredient(parse_for(kind, value)?),
            EntityKind::Company => AttributesPatch::Company(parse_for(kind, value)?),
        })
    }

    /// Apply onto a copy of the current attributes and validate the result
    pub fn apply_to(&self, current: &Attributes) -> AppResult<Attributes> {
        let mut next = current.clone();
        match (self, &mut next) {
            (AttributesPatch::Product(patch), Attributes::Product(attrs)) => patch.apply(attrs),
            (AttributesPatch::Category(patch), Attributes::Category(attrs)) => patch.apply(attrs),
            (AttributesPatch::Ingredient(patch), Attributes::Ingredient(attrs)) => {
                patch.apply(attrs)
            }
            (AttributesPatch::Company(patch), Attributes::Company(attrs)) => patch.apply(attrs),
            _ => {
                return Err(AppError::invalid_request(format!(
                    "Cannot apply {} patch to {}",
                    self.kind(),
                    current.kind()
                )));
            }
        }
        next.validate()?;
        Ok(next)
    }
}

/// Creation payload: attributes plus any initial translations
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDraft {
    pub attributes: Attributes,
    pub translations: BTreeMap<Locale, Translation>,
}

#[derive(Deserialize)]
struct RawDraft {
    #[serde(default)]
    attributes: Option<Value>,
    #[serde(default)]
    translations: BTreeMap<Locale, Translation>,
}

impl EntityDraft {
    /// Decode `{"attributes": {...}, "translations": {"en": {...}}}`
    pub fn from_json(kind: EntityKind, value: Value) -> AppResult<Self> {
        let raw: RawDraft = serde_json::from_value(value)
            .map_err(|e| AppError::validation(format!("Invalid {} payload: {}", kind, e)))?;
        let attributes = Attributes::from_json(
            kind,
            raw.attributes.unwrap_or_else(|| Value::Object(Default::default())),
        )?;
        Ok(Self {
            attributes,
            translations: raw.translations,
        })
    }

    pub fn validate(&self) -> AppResult<()> {
        self.attributes.validate()?;
        let kind = self.attributes.kind();
        for translation in self.translations.values() {
            translation.validate(kind)?;
        }
        Ok(())
    }
}

/// Committed menu entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Creator, used for self-resource permission checks
    pub owner: Option<UserId>,
    pub attributes: Attributes,
    pub translations: BTreeMap<Locale, Translation>,
    /// Incremented on every committed write
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity {
    pub fn locales(&self) -> Vec<Locale> {
        self.translations.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_draft_from_json() {
        let draft = EntityDraft::from_json(
            EntityKind::Product,
            json!({
                "attributes": {"price": 12.5, "stock": 3, "categories": [7]},
                "translations": {
                    "en": {"name": "Margherita", "description": "Tomato and mozzarella"},
                    "ES": {"name": "Margarita"}
                }
            }),
        )
        .unwrap();

        let Attributes::Product(product) = &draft.attributes else {
            panic!("expected product attributes");
        };
        assert_eq!(product.price, Decimal::new(125, 1));
        assert!(product.available);
        assert_eq!(draft.translations.len(), 2);
        assert!(draft.translations.contains_key(&Locale::parse("es").unwrap()));
        assert_eq!(
            draft.attributes.references(),
            vec![(EntityKind::Category, 7)]
        );
        draft.validate().unwrap();
    }

    #[test]
    fn test_category_draft_without_attributes() {
        let draft = EntityDraft::from_json(
            EntityKind::Category,
            json!({"translations": {"en": {"name": "Pizzas"}}}),
        )
        .unwrap();
        assert_eq!(draft.attributes.kind(), EntityKind::Category);
    }

    #[test]
    fn test_product_draft_requires_price() {
        let err = EntityDraft::from_json(EntityKind::Product, json!({"attributes": {}})).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_patch_apply_validates_result() {
        let current = Attributes::from_json(EntityKind::Product, json!({"price": 9.0})).unwrap();

        let patch = AttributesPatch::from_json(EntityKind::Product, json!({"stock": 4})).unwrap();
        let Attributes::Product(next) = patch.apply_to(&current).unwrap() else {
            panic!("expected product attributes");
        };
        assert_eq!(next.stock, 4);
        assert_eq!(next.price, Decimal::new(9, 0));

        let bad = AttributesPatch::from_json(EntityKind::Product, json!({"stock": -1})).unwrap();
        assert!(bad.apply_to(&current).is_err());
    }

    #[test]
    fn test_retain_references() {
        let mut attrs = Attributes::from_json(
            EntityKind::Product,
            json!({"price": 3.0, "categories": [1, 2], "ingredients": [2, 3]}),
        )
        .unwrap();
        attrs.retain_references(|kind, id| !(kind == EntityKind::Category && id == 2));
        assert_eq!(
            attrs.references(),
            vec![
                (EntityKind::Category, 1),
                (EntityKind::Ingredient, 2),
                (EntityKind::Ingredient, 3)
            ]
        );
    }

    #[test]
    fn test_patch_kind_mismatch() {
        let current = Attributes::from_json(EntityKind::Category, json!({})).unwrap();
        let patch = AttributesPatch::from_json(EntityKind::Ingredient, json!({"icon": "fa-leaf"})).unwrap();
        let err = patch.apply_to(&current).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }
}
