//! Product Model

use crate::error::{AppError, AppResult, ErrorCode};
use crate::types::EntityId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Non-translated product attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    /// Unit price, at least 0.01 with two decimal places
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub image: Option<String>,
    /// Category references
    #[serde(default)]
    pub categories: Vec<EntityId>,
    /// Ingredient references
    #[serde(default)]
    pub ingredients: Vec<EntityId>,
}

impl ProductAttributes {
    pub fn validate(&self) -> AppResult<()> {
        validate_price(self.price)?;
        if self.stock < 0 {
            return Err(AppError::validation("Stock cannot be negative").with_detail("field", "stock"));
        }
        Ok(())
    }
}

/// Price rules: >= 0.01, at most 2 decimal places, at most 10 digits overall
fn validate_price(price: Decimal) -> AppResult<()> {
    let invalid = |msg: &str| {
        AppError::with_message(ErrorCode::InvalidPrice, msg).with_detail("field", "price")
    };
    if price < Decimal::new(1, 2) {
        return Err(invalid("Price must be at least 0.01"));
    }
    if price.normalize().scale() > 2 {
        return Err(invalid("Price allows at most 2 decimal places"));
    }
    if price >= Decimal::new(100_000_000, 0) {
        return Err(invalid("Price exceeds 10 digits"));
    }
    Ok(())
}

/// Update product payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub available: Option<bool>,
    pub image: Option<String>,
    pub categories: Option<Vec<EntityId>>,
    pub ingredients: Option<Vec<EntityId>>,
}

impl ProductPatch {
    pub fn apply(&self, attrs: &mut ProductAttributes) {
        if let Some(price) = self.price {
            attrs.price = price;
        }
        if let Some(stock) = self.stock {
            attrs.stock = stock;
        }
        if let Some(available) = self.available {
            attrs.available = available;
        }
        if let Some(image) = &self.image {
            attrs.image = Some(image.clone());
        }
        if let Some(categories) = &self.categories {
            attrs.categories = categories.clone();
        }
        if let Some(ingredients) = &self.ingredients {
            attrs.ingredients = ingredients.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: Decimal) -> ProductAttributes {
        ProductAttributes {
            price,
            stock: 0,
            available: true,
            image: None,
            categories: vec![],
            ingredients: vec![],
        }
    }

    #[test]
    fn test_price_rules() {
        assert!(product(Decimal::new(1, 2)).validate().is_ok());
        assert!(product(Decimal::new(1250, 2)).validate().is_ok());
        assert!(product(Decimal::new(12500, 3)).validate().is_ok());

        let err = product(Decimal::ZERO).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrice);
        assert!(product(Decimal::new(1001, 3)).validate().is_err());
        assert!(product(Decimal::new(100_000_000, 0)).validate().is_err());
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let parsed: Result<ProductPatch, _> = serde_json::from_str(r#"{"owner": 5}"#);
        assert!(parsed.is_err());
    }
}
