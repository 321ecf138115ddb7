//! # Repository Module
//!
//! Database repository implementations for Fogón.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller (seed binary, tests)                                            │
//! │       │                                                                 │
//! │       │  db.recipes().calculate_cost(&burger.id)                        │
//! │       ▼                                                                 │
//! │  RecipeRepository ──► load_book (SQL) ──► fogon_core::costing (pure)    │
//! │  InventoryRepository ─► one transaction ─► ledger::insert_entry         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product creation, lookup and cost edits
//! - [`RecipeRepository`] - Recipe administration and costing
//! - [`InventoryRepository`] - Warehouses, receipts, consumption, transfers
//! - [`LedgerRepository`] - Vouchers and the trial balance
//!
//! [`ProductRepository`]: product::ProductRepository
//! [`RecipeRepository`]: recipe::RecipeRepository
//! [`InventoryRepository`]: inventory::InventoryRepository
//! [`LedgerRepository`]: ledger::LedgerRepository

pub mod inventory;
pub mod ledger;
pub mod product;
pub mod recipe;
