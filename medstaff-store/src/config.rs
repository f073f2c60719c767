//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `MEDSTAFF_`, nested keys split on `__`,
//!    e.g. `MEDSTAFF_DATABASE__DB_SCHEMA=clinic`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/medstaff/{service_name}/config.toml
//! 4. System directory: /etc/medstaff/{service_name}/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::table::validate_identifier;

const APP_NAME: &str = "medstaff";
const ENV_PREFIX: &str = "MEDSTAFF_";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Store connection
    pub database: DatabaseConfig,

    /// Explicit table names keyed by entity name, e.g. `Doctor = "Doctors"`
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
}

/// Service-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Log level or full `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for terminals
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MySQL connection URL
    pub connection_string: String,

    /// Schema holding the entity tables
    pub db_schema: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum idle connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// How long an operation waits for a connection, in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Retry attempts for the startup connectivity check
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between startup retries in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl DatabaseConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    0
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2
}

impl Config {
    /// Load configuration from all sources for the default service name
    pub fn load() -> Result<Self> {
        Self::load_for_service(APP_NAME)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first, so later merges win
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Skips the standard search paths. Environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Candidate config files, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let config_file_path = Path::new(service_name).join("config.toml");
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME);
        if let Some(path) = xdg_dirs.find_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(PathBuf::from("/etc").join(APP_NAME).join(config_file_path));
        paths
    }

    /// Reject values that would only fail later, at the first statement
    pub fn validate(&self) -> Result<()> {
        if self.database.connection_string.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "database.connection_string must not be empty".to_string(),
            ));
        }
        validate_identifier("schema", self.database.db_schema.trim())?;
        if self.database.max_connections == 0 {
            return Err(Error::InvalidConfig(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(Error::InvalidConfig(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        for (entity, table) in &self.tables {
            if !table.trim().is_empty() {
                validate_identifier("table", table.trim()).map_err(|e| {
                    Error::InvalidConfig(format!("tables.{}: {}", entity, e))
                })?;
            }
        }
        Ok(())
    }

    /// Explicit table name configured for an entity, if any
    ///
    /// Keys match case-insensitively: the env provider lowercases them, so
    /// `MEDSTAFF_TABLES__DOCTOR` arrives as `doctor`.
    pub fn table_override(&self, entity_name: &str) -> Option<&str> {
        self.tables
            .get(entity_name)
            .or_else(|| {
                self.tables
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(entity_name))
                    .map(|(_, table)| table)
            })
            .map(String::as_str)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: APP_NAME.to_string(),
                log_level: default_log_level(),
                log_format: LogFormat::default(),
            },
            database: DatabaseConfig {
                connection_string: "mysql://root@localhost:3306/clinic".to_string(),
                db_schema: "clinic".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connection_timeout_secs: default_connection_timeout(),
                max_retries: default_max_retries(),
                retry_delay_secs: default_retry_delay(),
            },
            tables: BTreeMap::new(),
        }
    }
}
