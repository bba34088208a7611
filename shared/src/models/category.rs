//! Category Model

use crate::error::AppResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAttributes {
    #[serde(default)]
    pub image: Option<String>,
}

impl CategoryAttributes {
    pub fn validate(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryPatch {
    pub image: Option<String>,
}

impl CategoryPatch {
    pub fn apply(&self, attrs: &mut CategoryAttributes) {
        if let Some(image) = &self.image {
            attrs.image = Some(image.clone());
        }
    }
}
