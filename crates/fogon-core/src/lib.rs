//! # fogon-core: Pure Business Logic for Fogón
//!
//! This crate is the **heart** of Fogón. It contains the costing, stock and
//! ledger rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Fogón Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Callers (POS sale, cost refresh, seed tool)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    fogon-db (Database Layer)                    │   │
//! │  │      loads RecipeBook, runs receipts/consumption in a tx        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fogon-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  costing  │  │ inventory │  │  ledger   │  │ validation│  │   │
//! │  │   │ walker    │  │ moving    │  │ vouchers  │  │   rules   │  │   │
//! │  │   │ calculator│  │ average   │  │ trial bal │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Recipe, StockLevel, StockMovement)
//! - [`costing`] - Recipe cost roll-up and ingredient explosion
//! - [`inventory`] - Moving-average cost and goods receipt input
//! - [`ledger`] - Double-entry vouchers and trial balance
//! - [`money`] - Money type with integer arithmetic for ledger postings
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use fogon_core::costing::{calculate_recipe_cost, RecipeBook};
//!
//! let book = RecipeBook::new();
//! // An empty book cannot resolve anything.
//! assert!(calculate_recipe_cost(&book, "missing").is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CostError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID (single-tenant runtime with multi-tenant schema).
///
/// Tenant schema routing happens outside this workspace; every row still
/// carries a tenant_id so the data can be moved into a tenant schema as-is.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum ingredients allowed in a single recipe.
pub const MAX_RECIPE_ITEMS: usize = 200;

/// Tolerance used when comparing derived floating-point quantities.
pub const QUANTITY_EPSILON: f64 = 1e-9;
