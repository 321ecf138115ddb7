//! # Domain Types
//!
//! Core domain types used throughout Fogón.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1   0..1 ┌─────────────────┐ 1    * ┌────────────┐│
//! │  │    Product      │──────────│     Recipe      │────────│ RecipeItem ││
//! │  │  ─────────────  │          │  ─────────────  │        │ ────────── ││
//! │  │  sku, name      │          │  product_id     │        │ ingredient ││
//! │  │  product_type   │          │  yield_qty      │        │ quantity   ││
//! │  │  cost (f64?)    │          └─────────────────┘        └─────┬──────┘│
//! │  │  enable_recipe_ │◄──────────────────────────────────────────┘       │
//! │  │  consumption    │            (ingredient is another Product)        │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │  ┌────────▼────────┐          ┌─────────────────┐                      │
//! │  │   StockLevel    │◄─────────│  StockMovement  │  append-only         │
//! │  │  (warehouse,    │ mutated  │  IN/OUT/TRANSFER│  audit trail         │
//! │  │   product,      │ together │  quantity       │                      │
//! │  │   variant)      │          │  reason, ref    │                      │
//! │  └─────────────────┘          └─────────────────┘                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, warehouse code) - human-readable, potentially mutable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product Type
// =============================================================================

/// What kind of item a product is, which decides how its cost and stock
/// are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Bought and resold as-is (a soda can).
    Retail,
    /// Raw material, never sold directly (flour, tomatoes).
    Raw,
    /// Manufactured in-house from a recipe (sauce, burger).
    Prepared,
    /// Sold but not stocked (a service, a combo label).
    Sellable,
}

impl ProductType {
    /// Database / wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::Retail => "RETAIL",
            ProductType::Raw => "RAW",
            ProductType::Prepared => "PREPARED",
            ProductType::Sellable => "SELLABLE",
        }
    }
}

impl Default for ProductType {
    fn default() -> Self {
        ProductType::Retail
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product: something sold, consumed or manufactured.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// How cost and stock are tracked.
    pub product_type: ProductType,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Unit cost in major currency units.
    ///
    /// `None` means nobody has entered or derived a cost yet; the recipe
    /// calculator reports it as a missing cost instead of assuming zero.
    pub cost: Option<f64>,

    /// Whether sales of this product consume its recipe ingredients.
    pub enable_recipe_consumption: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Only PREPARED products with recipe consumption enabled may own a
    /// recipe.
    #[inline]
    pub fn can_own_recipe(&self) -> bool {
        self.product_type == ProductType::Prepared && self.enable_recipe_consumption
    }

    /// Whether the cost of this product, used as an ingredient, comes from
    /// rolling up its own recipe rather than from the stored cost.
    #[inline]
    pub fn is_costed_by_recipe(&self) -> bool {
        self.can_own_recipe()
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// A bill of materials for one PREPARED product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Recipe {
    pub id: String,
    pub tenant_id: String,
    /// The output product (one-to-one).
    pub product_id: String,
    /// Quantity of output produced by one batch of the listed ingredients.
    pub yield_qty: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One ingredient line of a recipe, consumed per batch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipeItem {
    pub id: String,
    pub recipe_id: String,
    pub ingredient_id: String,
    pub quantity: f64,
}

/// A recipe together with its ingredient lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeWithItems {
    pub recipe: Recipe,
    pub items: Vec<RecipeItem>,
}

impl RecipeWithItems {
    #[inline]
    pub fn yield_qty(&self) -> f64 {
        self.recipe.yield_qty
    }
}

/// Input for one line when saving a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeItemInput {
    pub ingredient_id: String,
    pub quantity: f64,
}

impl RecipeItemInput {
    pub fn new(ingredient_id: impl Into<String>, quantity: f64) -> Self {
        RecipeItemInput {
            ingredient_id: ingredient_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Warehouse
// =============================================================================

/// A physical stock location (kitchen, store room, branch).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Warehouse {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Level
// =============================================================================

/// On-hand quantity for one (warehouse, product, variant).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    pub id: String,
    pub tenant_id: String,
    pub warehouse_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Can go negative when sales run ahead of receipts.
    pub quantity: f64,
    pub min_stock: Option<f64>,
    pub max_stock: Option<f64>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockLevel {
    /// True when a minimum is configured and the level is below it.
    pub fn is_below_minimum(&self) -> bool {
        self.min_stock.is_some_and(|min| self.quantity < min)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Goods entering a warehouse (receipt, return).
    In,
    /// Goods leaving a warehouse (sale consumption, waste).
    Out,
    /// Goods moving between two warehouses.
    Transfer,
}

/// An immutable entry in the stock audit trail.
///
/// Never updated or deleted after insert; the database enforces this with
/// triggers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    pub movement_type: MovementType,
    /// Destination for IN, source for OUT and TRANSFER.
    pub warehouse_id: String,
    /// Destination of a TRANSFER.
    pub to_warehouse_id: Option<String>,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Always positive; the direction is in `movement_type`.
    pub quantity: f64,
    /// Unit cost at the time of the movement, when known.
    pub unit_cost: Option<f64>,
    pub reason: String,
    /// External document (receipt number, sale id).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
