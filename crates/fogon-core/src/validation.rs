//! # Validation Module
//!
//! Input validation utilities for Fogón.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Repository call (fogon-db)                                   │
//! │  ├── Loads the rows the rule needs (owner product, ingredients)        │
//! │  └── Calls into THIS MODULE before opening a write transaction         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure rules)                                     │
//! │  ├── Quantities positive and finite                                    │
//! │  └── Recipe ownership, duplicates, self-reference                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (yield > 0, debit XOR credit)                   │
//! │  ├── UNIQUE constraints (sku, one recipe per product)                  │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fogon_core::validation::{validate_quantity, validate_sku};
//!
//! assert!(validate_sku("SALSA-01").is_ok());
//! assert!(validate_quantity(0.05).is_ok());
//! assert!(validate_quantity(f64::NAN).is_err());
//! ```

use std::collections::HashSet;

use crate::error::{CoreError, ValidationError};
use crate::types::{Product, RecipeItemInput};
use crate::MAX_RECIPE_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Should contain only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use fogon_core::validation::validate_sku;
///
/// assert!(validate_sku("PAN-BRIOCHE").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product or warehouse name (1-200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a free-text search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn require_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(())
}

/// Validates a stock or recipe quantity.
///
/// ## Rules
/// - Must be finite
/// - Must be positive (> 0); fractional quantities are normal (0.05 of a
///   sauce batch, 1.5 kg of flour)
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    require_finite("quantity", qty)?;

    if qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a recipe yield.
///
/// ## Example
/// ```rust
/// use fogon_core::validation::validate_recipe_yield;
///
/// assert!(validate_recipe_yield(10.0).is_ok());
/// assert!(validate_recipe_yield(0.0).is_err());
/// assert!(validate_recipe_yield(-1.0).is_err());
/// ```
pub fn validate_recipe_yield(yield_qty: f64) -> ValidationResult<()> {
    require_finite("yield", yield_qty)?;

    if yield_qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "yield".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit cost in major currency units. Zero is allowed
/// (donated goods, samples).
pub fn validate_unit_cost(cost: f64) -> ValidationResult<()> {
    require_finite("unit cost", cost)?;

    if cost < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit cost".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (raw materials are not sold)
///
/// ## Example
/// ```rust
/// use fogon_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1_800_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates optional minimum/maximum stock limits.
pub fn validate_stock_limits(min: Option<f64>, max: Option<f64>) -> ValidationResult<()> {
    for (field, value) in [("min_stock", min), ("max_stock", max)] {
        if let Some(value) = value {
            require_finite(field, value)?;
            if value < 0.0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: field.to_string(),
                });
            }
        }
    }

    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::InvertedRange {
                field: "stock".to_string(),
                min,
                max,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Recipe Validators
// =============================================================================

/// Checks that a product may own a recipe.
///
/// Only PREPARED products with recipe consumption enabled qualify.
pub fn validate_recipe_owner(product: &Product) -> Result<(), CoreError> {
    if product.can_own_recipe() {
        return Ok(());
    }

    let reason = if product.product_type != crate::types::ProductType::Prepared {
        format!("product type is {}", product.product_type.as_str())
    } else {
        "recipe consumption is disabled".to_string()
    };

    Err(CoreError::RecipeNotAllowed {
        sku: product.sku.clone(),
        reason,
    })
}

/// Validates the ingredient lines of a recipe for `owner`.
///
/// ## Rules
/// - At least one line, at most [`MAX_RECIPE_ITEMS`]
/// - Every quantity positive and finite
/// - No ingredient listed twice
/// - The owner is not one of its own ingredients
///
/// Indirect cycles (A uses B, B uses A) are not rejected here; the costing
/// algorithms detect and report them.
pub fn validate_recipe_items(owner: &Product, items: &[RecipeItemInput]) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "recipe items".to_string(),
        }
        .into());
    }

    if items.len() > MAX_RECIPE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "recipe items".to_string(),
            min: 1,
            max: MAX_RECIPE_ITEMS as i64,
        }
        .into());
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.ingredient_id == owner.id {
            return Err(CoreError::SelfReferencingRecipe {
                sku: owner.sku.clone(),
            });
        }

        validate_quantity(item.quantity)?;

        if !seen.insert(item.ingredient_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "ingredient".to_string(),
                value: item.ingredient_id.clone(),
            }
            .into());
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductType;
    use chrono::Utc;

    fn owner(product_type: ProductType, enable: bool) -> Product {
        let now = Utc::now();
        Product {
            id: "burger".to_string(),
            tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
            sku: "HAMB-01".to_string(),
            barcode: None,
            name: "Hamburguesa".to_string(),
            description: None,
            product_type,
            price_cents: 1_800_000,
            cost: None,
            enable_recipe_consumption: enable,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("HAMB-01").is_ok());
        assert!(validate_sku("pan_brioche").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Salsa de la casa").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0.05).is_ok());
        assert!(validate_quantity(1000.0).is_ok());

        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-1.0).is_err());
        assert!(validate_quantity(f64::INFINITY).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost(0.0).is_ok());
        assert!(validate_unit_cost(250.5).is_ok());
        assert!(matches!(
            validate_unit_cost(-1.0),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
        assert!(validate_unit_cost(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_stock_limits() {
        assert!(validate_stock_limits(None, None).is_ok());
        assert!(validate_stock_limits(Some(5.0), None).is_ok());
        assert!(validate_stock_limits(Some(5.0), Some(5.0)).is_ok());
        assert!(matches!(
            validate_stock_limits(Some(10.0), Some(5.0)),
            Err(ValidationError::InvertedRange { .. })
        ));
        assert!(validate_stock_limits(Some(-1.0), None).is_err());
    }

    #[test]
    fn test_validate_recipe_owner() {
        assert!(validate_recipe_owner(&owner(ProductType::Prepared, true)).is_ok());

        let err = validate_recipe_owner(&owner(ProductType::Raw, true)).unwrap_err();
        assert!(err.to_string().contains("RAW"));

        let err = validate_recipe_owner(&owner(ProductType::Prepared, false)).unwrap_err();
        assert!(matches!(err, CoreError::RecipeNotAllowed { .. }));
    }

    #[test]
    fn test_validate_recipe_items() {
        let burger = owner(ProductType::Prepared, true);

        let ok = vec![
            RecipeItemInput::new("bun", 1.0),
            RecipeItemInput::new("sauce", 0.05),
        ];
        assert!(validate_recipe_items(&burger, &ok).is_ok());

        assert!(validate_recipe_items(&burger, &[]).is_err());

        let self_ref = vec![RecipeItemInput::new("burger", 1.0)];
        assert!(matches!(
            validate_recipe_items(&burger, &self_ref),
            Err(CoreError::SelfReferencingRecipe { .. })
        ));

        let duplicate = vec![
            RecipeItemInput::new("bun", 1.0),
            RecipeItemInput::new("bun", 2.0),
        ];
        assert!(matches!(
            validate_recipe_items(&burger, &duplicate),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        let zero = vec![RecipeItemInput::new("bun", 0.0)];
        assert!(validate_recipe_items(&burger, &zero).is_err());
    }
}
