use serde::{Deserialize, Serialize};

use crate::error::{Result, SignetError};

/// Database configuration. Exactly one engine section must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection settings.
    #[serde(default)]
    pub postgres: Option<PostgresInfo>,

    /// SQLite connection settings.
    #[serde(default)]
    pub sqlite: Option<SqliteInfo>,

    /// Client pool tuning.
    #[serde(default)]
    pub sql_client: SqlClientParameters,
}

/// The engine selected by a [`DatabaseConfig`].
#[derive(Debug, Clone, Copy)]
pub enum EngineConfig<'a> {
    Postgres(&'a PostgresInfo),
    Sqlite(&'a SqliteInfo),
}

impl EngineConfig<'_> {
    /// Registry name of the dialect serving this engine.
    pub fn dialect_name(&self) -> &'static str {
        match self {
            EngineConfig::Postgres(_) => "postgres",
            EngineConfig::Sqlite(_) => "sqlite",
        }
    }
}

impl DatabaseConfig {
    pub fn postgres(info: PostgresInfo) -> Self {
        Self {
            postgres: Some(info),
            ..Default::default()
        }
    }

    pub fn sqlite(connection_string: impl Into<String>) -> Self {
        Self {
            sqlite: Some(SqliteInfo {
                connection_string: connection_string.into(),
            }),
            ..Default::default()
        }
    }

    /// The single configured engine.
    pub fn engine(&self) -> Result<EngineConfig<'_>> {
        match (&self.postgres, &self.sqlite) {
            (Some(postgres), None) => Ok(EngineConfig::Postgres(postgres)),
            (None, Some(sqlite)) => Ok(EngineConfig::Sqlite(sqlite)),
            (None, None) => Err(SignetError::Config(
                "no database engine configured, set one of [database.postgres] or [database.sqlite]"
                    .to_string(),
            )),
            (Some(_), Some(_)) => Err(SignetError::Config(
                "more than one database engine configured, set only one of [database.postgres] or [database.sqlite]"
                    .to_string(),
            )),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresInfo {
    pub host: String,

    #[serde(default = "default_postgres_port")]
    pub port: u16,

    /// URL scheme, `postgres` or `postgresql`.
    #[serde(default = "default_postgres_scheme")]
    pub scheme: String,

    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,

    pub database: String,
}

impl Default for PostgresInfo {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_postgres_port(),
            scheme: default_postgres_scheme(),
            username: String::new(),
            password: String::new(),
            ssl_mode: default_ssl_mode(),
            database: String::new(),
        }
    }
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_scheme() -> String {
    "postgres".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

/// SQLite connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteInfo {
    /// Driver connection string, with or without the `sqlite:` prefix.
    pub connection_string: String,
}

/// Pool parameters passed to the driver.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SqlClientParameters {
    /// Connections kept open while idle. Defaults to 2.
    #[serde(default)]
    pub max_idle_connections: Option<u32>,

    /// Upper bound of open connections. Defaults to 100.
    #[serde(default)]
    pub max_open_connections: Option<u32>,

    /// Maximum lifetime of a connection in milliseconds; 0 keeps it forever.
    #[serde(default)]
    pub max_connection_lifetime_ms: Option<u64>,
}

impl SqlClientParameters {
    pub const DEFAULT_MAX_IDLE_CONNECTIONS: u32 = 2;
    pub const DEFAULT_MAX_OPEN_CONNECTIONS: u32 = 100;
    pub const DEFAULT_MAX_CONNECTION_LIFETIME_MS: u64 = 0;

    pub fn max_idle_connections(&self) -> u32 {
        self.max_idle_connections
            .unwrap_or(Self::DEFAULT_MAX_IDLE_CONNECTIONS)
    }

    pub fn max_open_connections(&self) -> u32 {
        self.max_open_connections
            .unwrap_or(Self::DEFAULT_MAX_OPEN_CONNECTIONS)
    }

    pub fn max_connection_lifetime_ms(&self) -> u64 {
        self.max_connection_lifetime_ms
            .unwrap_or(Self::DEFAULT_MAX_CONNECTION_LIFETIME_MS)
    }
}
