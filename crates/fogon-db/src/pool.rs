//! # Database Handle
//!
//! Opens the SQLite store and hands out repositories over one shared pool.
//!
//! Every connection runs with WAL journaling, `synchronous = NORMAL` and
//! foreign keys on. Receipts and sales each hold a single connection for
//! the length of their transaction; cost lookups and reports share the rest.
//!
//! An in-memory store lives and dies with its only connection, so
//! [`DbConfig::in_memory`] pins the pool to one connection that is never
//! recycled.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::inventory::InventoryRepository;
use crate::repository::ledger::LedgerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::recipe::RecipeRepository;

const IN_MEMORY: &str = ":memory:";

/// Where the store lives and how the pool is sized.
///
/// Built from [`AppConfig::db_config`](crate::config::AppConfig::db_config)
/// by the binaries, or from [`DbConfig::in_memory`] in tests.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Upper bound on pooled connections. Default: 5
    pub max_connections: u32,
    /// Apply pending migrations when the pool opens. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            run_migrations: true,
        }
    }

    /// Private in-memory store with a single connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

/// Handle to the Fogón store.
///
/// ```rust,ignore
/// let db = Database::new(config.db_config()).await?;
/// let cost = db.recipes().calculate_cost(&burger.id).await?;
/// db.inventory().consume_for_sale(&bodega.id, &burger.id, 2.0, Some("VENTA-17")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening Fogón database");

        let connect_url = if config.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", config.database_path.display())
        };

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        if config.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        Ok(Database { pool })
    }

    /// Raw pool access for diagnostics and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Recipe administration and costing.
    pub fn recipes(&self) -> RecipeRepository {
        RecipeRepository::new(self.pool.clone())
    }

    /// Receipts, sale consumption, transfers and stock levels.
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total > 0);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_file_database_keeps_data_across_opens() {
        let dir = std::env::temp_dir().join(format!("fogon-pool-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fogon.db");

        let db = Database::new(DbConfig::new(&path).max_connections(2)).await.unwrap();
        db.inventory().create_warehouse("BOD-1", "Bodega").await.unwrap();
        drop(db);

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let warehouses = db.inventory().list_warehouses().await.unwrap();
        assert_eq!(warehouses.len(), 1);
        assert_eq!(warehouses[0].code, "BOD-1");

        drop(db);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/fogon-test.db")
            .max_connections(10)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
