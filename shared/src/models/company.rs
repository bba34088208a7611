//! Company Model
//!
//! The restaurant's own record. Its name and address are translated; the
//! address lives in the translation's `description`.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyAttributes {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CompanyAttributes {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(email) = &self.email
            && !looks_like_email(email)
        {
            return Err(AppError::validation("Invalid email").with_detail("field", "email"));
        }
        if let Some(phone) = &self.phone
            && phone.chars().count() > 20
        {
            return Err(AppError::validation("Phone must be at most 20 characters")
                .with_detail("field", "phone"));
        }
        Ok(())
    }
}

/// Minimal shape check: one `@` with something on each side and a dot in the domain
pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
}

impl CompanyPatch {
    pub fn apply(&self, attrs: &mut CompanyAttributes) {
        if let Some(email) = &self.email {
            attrs.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            attrs.phone = Some(phone.clone());
        }
        if let Some(image) = &self.image {
            attrs.image = Some(image.clone());
        }
    }
}
