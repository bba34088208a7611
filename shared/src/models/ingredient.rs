//! Ingredient Model

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const ICON_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientAttributes {
    /// Icon identifier shown next to the ingredient
    #[serde(default)]
    pub icon: Option<String>,
}

impl IngredientAttributes {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(icon) = &self.icon
            && icon.chars().count() > ICON_MAX_LEN
        {
            return Err(AppError::validation(format!(
                "Icon must be at most {} characters",
                ICON_MAX_LEN
            ))
            .with_detail("field", "icon"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngredientPatch {
    pub icon: Option<String>,
}

impl IngredientPatch {
    pub fn apply(&self, attrs: &mut IngredientAttributes) {
        if let Some(icon) = &self.icon {
            attrs.icon = Some(icon.clone());
        }
    }
}
