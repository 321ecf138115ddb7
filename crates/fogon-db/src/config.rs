//! # Application Configuration
//!
//! Settings for binaries that open a Fogón database.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults          AppConfig::default()                              │
//! │  2. Config file       <config dir>/fogon.toml (optional)                │
//! │  3. Environment       FOGON_DB_PATH, FOGON_DB_MAX_CONNECTIONS,          │
//! │                       FOGON_LOG                                         │
//! │  4. validate()                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example File
//! ```toml
//! [database]
//! path = "/var/lib/fogon/fogon.db"
//! max_connections = 5
//!
//! [logging]
//! filter = "info,fogon=debug,sqlx=warn"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::pool::DbConfig;

/// Default tracing filter when neither `RUST_LOG` nor config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,fogon=debug,sqlx=warn";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: default_database_path(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSection,
    pub logging: LoggingSection,
    /// File the settings were read from; `None` when only defaults and
    /// environment applied. Loading happens before tracing is installed, so
    /// binaries log this once the subscriber is up.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with a custom environment source.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
                config.source = Some(path);
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(env)?;
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if EnvFilter::try_new(&self.logging.filter).is_err() {
            return Err(ConfigError::InvalidValue("logging.filter".into()));
        }

        Ok(())
    }

    fn apply_env_overrides<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = env("FOGON_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = env("FOGON_DB_MAX_CONNECTIONS") {
            self.database.max_connections = max
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FOGON_DB_MAX_CONNECTIONS".into()))?;
        }

        if let Some(filter) = env("FOGON_LOG") {
            self.logging.filter = filter;
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("co", "fogon", "fogon")
            .map(|dirs| dirs.config_dir().join("fogon.toml"))
    }

    /// Database settings for [`Database::new`](crate::Database::new).
    pub fn db_config(&self) -> DbConfig {
        if self.database.path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }

    /// Installs the global tracing subscriber.
    ///
    /// `RUST_LOG` wins over the configured filter. Calling this twice is a
    /// no-op apart from a warning.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.filter));

        if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
            warn!("Tracing subscriber already installed");
        }
    }
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("co", "fogon", "fogon")
        .map(|dirs| dirs.data_dir().join("fogon.db"))
        .unwrap_or_else(|| PathBuf::from("fogon.db"))
}
