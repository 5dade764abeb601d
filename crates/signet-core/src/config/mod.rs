mod database;
mod logging;

pub use database::{DatabaseConfig, EngineConfig, PostgresInfo, SqlClientParameters, SqliteInfo};
pub use logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SignetError};

/// Root configuration for signet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignetConfig {
    /// Database configuration.
    pub database: DatabaseConfig,

    /// Migration and mapper locations.
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SignetConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SignetError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = substitute_env_vars(content);

        let config: Self = toml::from_str(&content)
            .map_err(|e| SignetError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for a single SQLite database with defaults elsewhere.
    pub fn default_with_sqlite(connection_string: &str) -> Self {
        Self {
            database: DatabaseConfig::sqlite(connection_string),
            migrations: MigrationsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        self.database.engine()?;
        if let Some(target) = self.migrations.target_version {
            if target < 0 {
                return Err(SignetError::Config(format!(
                    "migrations.target_version must not be negative, got {}",
                    target
                )));
            }
        }
        Ok(())
    }
}

/// Migration and statement mapper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Root of the per-dialect migration directories.
    #[serde(default = "default_schemas_path")]
    pub schemas_path: String,

    /// Root of the per-dialect mapper directories.
    #[serde(default = "default_mappers_path")]
    pub mappers_path: String,

    /// Prefix for the migrations table.
    #[serde(default)]
    pub table_prefix: Option<String>,

    /// Version to migrate to. Defaults to the latest step.
    #[serde(default)]
    pub target_version: Option<i64>,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            schemas_path: default_schemas_path(),
            mappers_path: default_mappers_path(),
            table_prefix: None,
            target_version: None,
        }
    }
}

fn default_schemas_path() -> String {
    "include/dbschemas".to_string()
}

fn default_mappers_path() -> String {
    crate::storage::DEFAULT_MAPPERS_PATH.to_string()
}

/// Replace `${VAR}` with the value of the environment variable, leaving
/// unknown variables untouched.
fn substitute_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
        return content.to_string();
    };

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
