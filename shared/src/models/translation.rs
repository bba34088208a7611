//! Translation Model

use super::EntityKind;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Translatable fields of one entity in one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Translation {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    /// Length rules depend on the entity kind
    pub fn validate(&self, kind: EntityKind) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Name is required").with_detail("field", "name"));
        }
        let max = kind.name_max_len();
        if self.name.chars().count() > max {
            return Err(AppError::validation(format!(
                "Name must be at most {} characters",
                max
            ))
            .with_detail("field", "name"));
        }
        if let (Some(description), Some(max)) = (&self.description, kind.description_max_len())
            && description.chars().count() > max
        {
            return Err(AppError::validation(format!(
                "Description must be at most {} characters",
                max
            ))
            .with_detail("field", "description"));
        }
        Ok(())
    }
}
