//! # fogon-db: Database Layer for Fogón
//!
//! This crate provides database access for Fogón. It uses SQLite with sqlx
//! for async operations and hands prefetched recipe graphs to the pure
//! algorithms in `fogon-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Fogón Data Flow                                │
//! │                                                                         │
//! │  Caller (sale handler, cost refresh job, seed tool)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fogon-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Product       │    │ 0001 recipes │  │   │
//! │  │   │ SqlitePool    │◄───│ Recipe        │    │ 0002 stock   │  │   │
//! │  │   │ WAL + FKs     │    │ Inventory     │    │ 0003 ledger  │  │   │
//! │  │   │               │    │ Ledger        │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ RecipeBook                    │   │
//! │  │                                ▼                               │   │
//! │  │                    fogon_core::costing (pure)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Application configuration (defaults, TOML file, env)
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fogon_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./fogon.db")).await?;
//!
//! let cost = db.recipes().calculate_cost(&burger_id).await?;
//! let outcome = db.inventory().receive_goods(&receipt).await?;
//! let tb = db.ledger().trial_balance().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::recipe::RecipeRepository;
