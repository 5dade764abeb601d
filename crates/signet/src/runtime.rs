//! Composition root for the persistence layer.
//!
//! Wires the dialect registry, the shared connection, the single migrator
//! and the persistence engine from one [`SignetConfig`].

use std::sync::Arc;

use tracing::info;

use signet_core::config::SignetConfig;
use signet_core::error::Result;
use signet_core::fs::ReadDirAndFileFs;
use signet_core::storage::{Storage, StorageConfig, StorageConfigOptions};
use signet_runtime::db::{
    Connection, DialectRegistry, Fw, FwOptions, MigrationVersion, TransactionalManager,
};
use signet_runtime::migrations::{DbMigrator, MigrateFromFilesInput};

/// The persistence layer of a running process.
pub struct Signet {
    config: SignetConfig,
    connection: Arc<Connection>,
    migrator: DbMigrator,
}

impl Signet {
    /// Connect using the built-in dialects.
    pub async fn connect(config: SignetConfig) -> Result<Self> {
        let registry = DialectRegistry::with_builtin_dialects();
        Self::connect_with_registry(config, &registry).await
    }

    pub async fn connect_with_registry(
        config: SignetConfig,
        registry: &DialectRegistry,
    ) -> Result<Self> {
        let connection = Arc::new(Connection::new(registry, &config.database).await?);
        info!("Connected to database with dialect [{}]", connection.dialect_name());

        let migrator = DbMigrator::new(Arc::clone(&connection));
        Ok(Self {
            config,
            connection,
            migrator,
        })
    }

    pub fn config(&self) -> &SignetConfig {
        &self.config
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn migrator(&self) -> &DbMigrator {
        &self.migrator
    }

    /// Apply the migrations found in `fs` up to `target_version`, falling
    /// back to the configured target and then to the latest step.
    pub async fn migrate(
        &self,
        fs: &dyn ReadDirAndFileFs,
        target_version: Option<i64>,
    ) -> Result<()> {
        let migrations = &self.config.migrations;
        self.migrator
            .migrate_from_files(MigrateFromFilesInput {
                fs,
                target_version: target_version.or(migrations.target_version),
                migrations_table_prefix: migrations.table_prefix.clone(),
                schemas_path: Some(migrations.schemas_path.clone()),
            })
            .await
    }

    pub async fn current_version(&self) -> Result<MigrationVersion> {
        self.migrator
            .current_version(self.config.migrations.table_prefix.as_deref())
            .await
    }

    /// Load the statement mappers of the connected dialect from `fs`.
    pub fn load_statements(&self, fs: &dyn ReadDirAndFileFs) -> Result<StorageConfig> {
        let config = StorageConfig::new(StorageConfigOptions {
            fs,
            mappers_path: Some(self.config.migrations.mappers_path.as_str()),
            driver: self.connection.dialect_name(),
        })?;
        info!(
            "Loaded {} statements for dialect [{}]",
            config.len(),
            self.connection.dialect_name()
        );
        Ok(config)
    }

    /// Build the persistence engine with the mappers found in `fs`.
    pub fn storage(&self, fs: &dyn ReadDirAndFileFs) -> Result<Arc<Fw>> {
        let mut fw = Fw::new(FwOptions {
            connection: Arc::clone(&self.connection),
            slow_statement_threshold: self.config.logging.slow_statement_threshold(),
        });
        fw.add_config(self.load_statements(fs)?)?;
        Ok(Arc::new(fw))
    }

    /// Migrate to the configured version, then build the engine and its
    /// transactional manager.
    pub async fn start(&self, fs: &dyn ReadDirAndFileFs) -> Result<TransactionalManager<Fw>> {
        self.migrate(fs, None).await?;
        Ok(TransactionalManager::new(self.storage(fs)?))
    }

    pub async fn close(&self) {
        self.connection.close().await;
    }
}
