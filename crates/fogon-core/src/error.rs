//! # Error Types
//!
//! Domain-specific error types for fogon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fogon-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  ├── CostError        - Costing / ingredient resolution problems       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fogon-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError / CostError → CoreError → DbError → caller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `CostError` doubles as the message catalogue for
//! [`RecipeCost::errors`](crate::costing::RecipeCost): the calculator records
//! non-fatal problems as the `Display` text of these variants.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Warehouse cannot be found or is inactive.
    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(String),

    /// Product is not allowed to own a recipe.
    ///
    /// ## When This Occurs
    /// - Saving a recipe for a RAW/RETAIL/SELLABLE product
    /// - Saving a recipe for a PREPARED product with recipe consumption off
    #[error("Product {sku} cannot own a recipe: {reason}")]
    RecipeNotAllowed { sku: String, reason: String },

    /// Recipe consumption cannot be turned off while the product owns a
    /// recipe.
    #[error("Product {sku} owns a recipe; delete it before disabling recipe consumption")]
    RecipeStillAttached { sku: String },

    /// A recipe lists its own product as an ingredient.
    #[error("Recipe for {sku} cannot use itself as an ingredient")]
    SelfReferencingRecipe { sku: String },

    /// Source and destination warehouse of a transfer are the same.
    #[error("Cannot transfer stock from warehouse {0} to itself")]
    SameWarehouseTransfer(String),

    /// Journal entry debits and credits differ.
    #[error("Journal entry is unbalanced: debits {debits}, credits {credits}")]
    UnbalancedEntry { debits: Money, credits: Money },

    /// A single journal line is malformed.
    #[error("Invalid journal line {line}: {reason}")]
    InvalidJournalLine { line: usize, reason: String },

    /// Costing failure (wraps CostError).
    #[error("Costing error: {0}")]
    Cost(#[from] CostError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Cost Error
// =============================================================================

/// Recipe costing and ingredient resolution errors.
///
/// ## Fatal vs recorded
/// ```text
/// resolve_all_ingredients   → returns Err for everything except cycles
/// calculate_recipe_cost     → returns Err only for a missing root product,
///                             everything else lands in RecipeCost::errors
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostError {
    /// A product referenced by id is not in the recipe graph.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A recipe declares a yield that is zero, negative or NaN.
    #[error("Recipe yield must be greater than 0")]
    InvalidYield { product: String, yield_qty: f64 },

    /// The recipe graph loops back onto a product already being costed.
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// An ingredient has no usable cost.
    #[error("Missing cost for ingredient: {0}")]
    MissingCost(String),

    /// The requested quantity cannot be expanded.
    #[error("Invalid quantity {quantity} for product {product}")]
    InvalidQuantity { product: String, quantity: f64 },

    /// Arithmetic went somewhere it should not (overflow to infinity, NaN).
    #[error("Error calculating cost: {0}")]
    Computation(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., NaN or infinite quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., same ingredient listed twice).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Lower bound is above upper bound.
    #[error("{field} minimum {min} is greater than maximum {max}")]
    InvertedRange { field: String, min: f64, max: f64 },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for costing Results.
pub type CostResult<T> = Result<T, CostError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_error_messages() {
        assert_eq!(
            CostError::CircularDependency("Salsa".to_string()).to_string(),
            "Circular dependency detected: Salsa"
        );
        assert_eq!(
            CostError::MissingCost("Pan".to_string()).to_string(),
            "Missing cost for ingredient: Pan"
        );
        let err = CostError::InvalidYield {
            product: "Hamburguesa".to_string(),
            yield_qty: 0.0,
        };
        assert_eq!(err.to_string(), "Recipe yield must be greater than 0");
    }

    #[test]
    fn test_unbalanced_entry_message() {
        let err = CoreError::UnbalancedEntry {
            debits: Money::from_cents(1000),
            credits: Money::from_cents(900),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is unbalanced: debits $10.00, credits $9.00"
        );
    }

    #[test]
    fn test_recipe_still_attached_message() {
        let err = CoreError::RecipeStillAttached {
            sku: "SALSA".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Product SALSA owns a recipe; delete it before disabling recipe consumption"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = CostError::ProductNotFound("x".to_string()).into();
        assert!(matches!(core_err, CoreError::Cost(_)));
    }
}
