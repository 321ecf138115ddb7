//! # Inventory Module
//!
//! Moving-average costing and the inputs/outputs of stock operations.
//!
//! ## Goods Receipt Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GoodsReceipt { warehouse, lines[] }                                    │
//! │        │                                                                │
//! │        ▼  validate()                          (this module, pure)       │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │  ONE TRANSACTION (fogon-db InventoryRepository::receive_goods)    │  │
//! │  │                                                                   │  │
//! │  │  per line:                                                        │  │
//! │  │    1. INSERT stock_movements (IN)                                 │  │
//! │  │    2. on_hand = Σ stock_levels.quantity for product               │  │
//! │  │    3. UPSERT stock_levels += quantity                             │  │
//! │  │    4. products.cost = moving_average_cost(on_hand, cost, qty, uc) │  │
//! │  │                                                                   │  │
//! │  │  then: voucher  Dr 1435 Inventario / Cr 2205 Proveedores          │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::types::StockMovement;
use crate::validation::{validate_quantity, validate_unit_cost, ValidationResult};

// =============================================================================
// Moving Average
// =============================================================================

/// Weighted-average unit cost after receiving `received` units at
/// `unit_cost`.
///
/// ## Rules
/// - Negative on-hand stock carries no value and counts as zero
/// - A product without a cost takes the receipt's unit cost
/// - If the combined quantity is not positive the receipt's unit cost wins
///
/// ## Example
/// ```rust
/// use fogon_core::inventory::moving_average_cost;
///
/// // 10 units at 100 + 30 units at 200 → 175
/// assert_eq!(moving_average_cost(10.0, Some(100.0), 30.0, 200.0), 175.0);
/// // First receipt of a product without cost
/// assert_eq!(moving_average_cost(0.0, None, 5.0, 80.0), 80.0);
/// ```
pub fn moving_average_cost(
    on_hand: f64,
    current_cost: Option<f64>,
    received: f64,
    unit_cost: f64,
) -> f64 {
    let existing = on_hand.max(0.0);
    let current = current_cost.unwrap_or(unit_cost);
    let combined = existing + received;

    if combined <= 0.0 {
        return unit_cost;
    }

    (existing * current + received * unit_cost) / combined
}

// =============================================================================
// Goods Receipt
// =============================================================================

/// One product line of a goods receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: f64,
    /// Purchase cost per unit, major currency units.
    pub unit_cost: f64,
}

impl ReceiptLine {
    pub fn new(product_id: impl Into<String>, quantity: f64, unit_cost: f64) -> Self {
        ReceiptLine {
            product_id: product_id.into(),
            variant_id: None,
            quantity,
            unit_cost,
        }
    }

    /// Line value rounded to cents.
    pub fn value(&self) -> Money {
        Money::from_major_f64(self.quantity * self.unit_cost)
    }
}

/// Goods arriving from a supplier into one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GoodsReceipt {
    pub warehouse_id: String,
    /// Supplier invoice or delivery note number.
    pub reference: Option<String>,
    pub lines: Vec<ReceiptLine>,
}

impl GoodsReceipt {
    /// Checks that the receipt has lines and every line is well-formed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.warehouse_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "warehouse".to_string(),
            }
            .into());
        }

        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "receipt lines".to_string(),
            }
            .into());
        }

        for line in &self.lines {
            validate_line(line)?;
        }

        Ok(())
    }

    /// Total receipt value, each line rounded to cents before summing.
    pub fn total_value(&self) -> Money {
        self.lines.iter().map(ReceiptLine::value).sum()
    }
}

fn validate_line(line: &ReceiptLine) -> ValidationResult<()> {
    if line.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product".to_string(),
        });
    }
    validate_quantity(line.quantity)?;
    validate_unit_cost(line.unit_cost)
}

/// What a committed goods receipt changed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptOutcome {
    pub movements: Vec<StockMovement>,
    /// New moving-average cost per product, in receipt order.
    pub updated_costs: Vec<(String, f64)>,
    /// Voucher posted for the receipt; `None` when its value was zero.
    pub journal_entry_id: Option<String>,
}

/// What a committed sale consumption changed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsumptionOutcome {
    pub movements: Vec<StockMovement>,
    /// Value of the consumed ingredients that have a cost.
    pub cost_of_sales: Money,
    /// Ingredients consumed without a known cost.
    pub unvalued: Vec<String>,
    /// Products dropped from the explosion because of recipe cycles.
    pub skipped_cycles: Vec<String>,
    pub journal_entry_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
