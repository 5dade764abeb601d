//! Versioned schema migrations with a dirty bit.
//!
//! The migrations table holds a single `{version, dirty, description}` row.
//! Every step is bracketed: the row is marked dirty, the script runs outside
//! any transaction, and the row is marked clean. A failure leaves the dirty
//! row behind and later runs refuse to continue until an operator repairs it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use signet_core::error::{Result, SignetError};
use signet_core::fs::ReadDirAndFileFs;

use super::manifest::{strip_leading_slash, MigrationManifest, MANIFEST_FILE_NAME};
use super::plan::plan_steps;
use crate::db::{Connection, MigrationVersion, Migrator};

/// Default location of the per-dialect migration directories.
pub const DEFAULT_SCHEMAS_PATH: &str = "include/dbschemas";

/// A single migration step with its scripts already loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub up: String,
    pub down: String,
    pub version_description: String,
}

impl MigrationStep {
    pub fn new(
        up: impl Into<String>,
        down: impl Into<String>,
        version_description: impl Into<String>,
    ) -> Self {
        Self {
            up: up.into(),
            down: down.into(),
            version_description: version_description.into(),
        }
    }
}

/// A full migration request.
#[derive(Debug, Clone)]
pub struct Migration {
    pub steps: Vec<MigrationStep>,
    pub target_version: i64,
    pub migrations_table_prefix: Option<String>,
}

/// Input of [`DbMigrator::migrate_from_files`].
pub struct MigrateFromFilesInput<'a> {
    pub fs: &'a dyn ReadDirAndFileFs,
    /// Version to reach; defaults to the number of steps.
    pub target_version: Option<i64>,
    pub migrations_table_prefix: Option<String>,
    /// Root of the per-dialect directories; defaults to [`DEFAULT_SCHEMAS_PATH`].
    pub schemas_path: Option<String>,
}

/// Applies migrations through the connection's dialect.
///
/// Create one per process; concurrent calls are serialised.
pub struct DbMigrator {
    connection: Arc<Connection>,
    lock: Mutex<()>,
}

impl DbMigrator {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            connection,
            lock: Mutex::new(()),
        }
    }

    /// Bring the schema to `migration.target_version`.
    pub async fn migrate(&self, migration: &Migration) -> Result<()> {
        let _guard = self.lock.lock().await;
        let migrator = self.connection.migrator();

        migrator.open_connection().await?;

        let result = self.migrate_inner(migrator, migration).await;

        // Always close the dedicated connection, even on error
        if let Err(e) = migrator.close_connection().await {
            warn!("Failed to close migration connection: {}", e);
        }

        result
    }

    async fn migrate_inner(&self, migrator: &dyn Migrator, migration: &Migration) -> Result<()> {
        migrator
            .init_migration(migration.migrations_table_prefix.as_deref())
            .await?;

        let current = migrator.get_migration_version().await?;
        debug!("Current migration version: {:?}", current);

        if current.dirty {
            return Err(SignetError::DirtyMigration {
                version: current.version,
            });
        }

        if current.version == migration.target_version {
            info!(
                "Schema already at version {}, nothing to migrate",
                current.version
            );
            return Ok(());
        }

        let steps = plan_steps(&migration.steps, current.version, migration.target_version)?;
        info!(
            "Migrating schema from version {} to {} ({} steps)",
            current.version,
            migration.target_version,
            steps.len()
        );

        for step in steps {
            let mut version = MigrationVersion::new(step.version, true, step.description);

            info!("Set migration step [{}] as dirty", version.version);
            migrator.set_migration_version(version.clone()).await?;

            info!(
                "Executing migration step [{}] with description [{}]",
                version.version, version.description
            );
            migrator.run_migration(step.script).await?;

            version.dirty = false;
            info!("Set migration step [{}] as not dirty", version.version);
            migrator.set_migration_version(version).await?;
        }

        info!("Migration to version {} completed", migration.target_version);
        Ok(())
    }

    /// Load `<schemas_path>/<dialect>/db_migration_steps.yml` and its scripts
    /// from `input.fs`, then migrate.
    pub async fn migrate_from_files(&self, input: MigrateFromFilesInput<'_>) -> Result<()> {
        let schemas_path = input
            .schemas_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SCHEMAS_PATH);
        let steps = load_steps(input.fs, schemas_path, self.connection.dialect_name())?;
        let target_version = input.target_version.unwrap_or(steps.len() as i64);

        let migration = Migration {
            steps,
            target_version,
            migrations_table_prefix: input.migrations_table_prefix,
        };
        self.migrate(&migration).await
    }

    /// Read the version row without migrating.
    pub async fn current_version(&self, table_prefix: Option<&str>) -> Result<MigrationVersion> {
        let _guard = self.lock.lock().await;
        let migrator = self.connection.migrator();

        migrator.open_connection().await?;

        let result = async {
            migrator.init_migration(table_prefix).await?;
            migrator.get_migration_version().await
        }
        .await;

        if let Err(e) = migrator.close_connection().await {
            warn!("Failed to close migration connection: {}", e);
        }

        result
    }
}

/// Read the manifest of `dialect` and every script it references.
///
/// Script paths in the manifest are relative to the root of `fs`, not to
/// the manifest's directory.
pub fn load_steps(
    fs: &dyn ReadDirAndFileFs,
    schemas_path: &str,
    dialect: &str,
) -> Result<Vec<MigrationStep>> {
    let dir = format!("{}/{}", schemas_path.trim_end_matches('/'), dialect);
    let manifest_path = format!("{}/{}", dir, MANIFEST_FILE_NAME);

    let manifest = read_text(fs, &manifest_path)?;
    let manifest = MigrationManifest::parse_yaml(&manifest)?;

    manifest
        .migration_steps
        .into_iter()
        .map(|step| {
            let up = read_text(fs, strip_leading_slash(&step.up))?;
            let down = read_text(fs, strip_leading_slash(&step.down))?;
            Ok(MigrationStep {
                up,
                down,
                version_description: step.version_description,
            })
        })
        .collect()
}

fn read_text(fs: &dyn ReadDirAndFileFs, path: &str) -> Result<String> {
    let bytes = fs
        .read_file(path)
        .map_err(|e| SignetError::Migration(format!("can not read [{}]: {}", path, e)))?;
    String::from_utf8(bytes)
        .map_err(|e| SignetError::Migration(format!("[{}] is not valid utf-8: {}", path, e)))
}
