//! Capabilities every database dialect provides.
//!
//! A dialect is split in three groups: [`Opener`] builds and opens the pool,
//! [`Migrator`] runs migration primitives on a dedicated connection, and
//! [`ErrorTranslator`] maps driver errors onto [`PersistenceError`] kinds.

use futures::future::BoxFuture;
use sqlx::AnyPool;

use signet_core::config::{EngineConfig, SqlClientParameters};
use signet_core::error::Result;
use signet_core::storage::{PersistenceError, StorageResult};

/// Driver name and connection string produced by [`Opener::connection_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionData {
    pub driver: String,
    pub connection_string: String,
}

/// The single row of the migrations table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationVersion {
    pub version: i64,
    pub dirty: bool,
    pub description: String,
}

impl MigrationVersion {
    pub fn new(version: i64, dirty: bool, description: impl Into<String>) -> Self {
        Self {
            version,
            dirty,
            description: description.into(),
        }
    }
}

pub trait Opener: Send + Sync {
    /// Validate the engine settings and derive the connection string.
    fn connection_data(&self, engine: EngineConfig<'_>) -> StorageResult<ConnectionData>;

    /// Open the pool. The dialect keeps a handle for its migration primitives.
    fn connect<'a>(
        &'a self,
        data: &'a ConnectionData,
        params: &'a SqlClientParameters,
    ) -> BoxFuture<'a, StorageResult<AnyPool>>;
}

/// Migration primitives, executed directly without templating.
pub trait Migrator: Send + Sync {
    /// Detach a dedicated connection from the pool.
    fn open_connection(&self) -> BoxFuture<'_, Result<()>>;

    /// Select the migrations table (`<prefix>_<default>`) and create it if missing.
    fn init_migration<'a>(&'a self, table_prefix: Option<&'a str>) -> BoxFuture<'a, Result<()>>;

    /// Current version; an empty table reads as `{0, false, ""}`.
    fn get_migration_version(&self) -> BoxFuture<'_, Result<MigrationVersion>>;

    /// Replace the version row inside a transaction.
    fn set_migration_version(&self, version: MigrationVersion) -> BoxFuture<'_, Result<()>>;

    /// Run a script on the dedicated connection, outside any transaction.
    fn run_migration<'a>(&'a self, script: &'a str) -> BoxFuture<'a, Result<()>>;

    fn close_connection(&self) -> BoxFuture<'_, Result<()>>;
}

pub trait ErrorTranslator: Send + Sync {
    /// Map a driver error, falling back to `default` when it is not recognised.
    fn translate_error(&self, err: &sqlx::Error, default: PersistenceError) -> PersistenceError;
}

/// A complete dialect plugin.
pub trait Dialect: Opener + Migrator + ErrorTranslator {
    /// Positional placeholder for the 1-based parameter `position`.
    fn placeholder(&self, position: usize) -> String;

    fn as_migrator(&self) -> &dyn Migrator;

    fn as_error_translator(&self) -> &dyn ErrorTranslator;
}
