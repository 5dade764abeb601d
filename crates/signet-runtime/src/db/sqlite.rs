//! SQLite dialect.

use std::collections::HashMap;

use futures::future::BoxFuture;
use sqlx::AnyPool;

use signet_core::config::{EngineConfig, SqlClientParameters};
use signet_core::error::Result;
use signet_core::storage::{PersistenceError, StorageResult};

use super::connection::pool_options;
use super::dialect::{ConnectionData, Dialect, ErrorTranslator, MigrationVersion, Migrator, Opener};
use super::session::{MigrationSession, SessionSql};

/// `SQLITE_CONSTRAINT` primary result code.
const SQLITE_CONSTRAINT: i32 = 19;

pub struct SqliteDialect {
    error_map: HashMap<i32, PersistenceError>,
    session: MigrationSession,
}

impl SqliteDialect {
    pub fn new() -> Self {
        let mut error_map = HashMap::new();
        error_map.insert(SQLITE_CONSTRAINT, PersistenceError::already_exists());

        Self {
            error_map,
            session: MigrationSession::new(SessionSql {
                clear_table: "DELETE FROM",
                placeholder: sqlite_placeholder,
            }),
        }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

fn sqlite_placeholder(position: usize) -> String {
    format!("?{}", position)
}

fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string.starts_with("sqlite:") {
        connection_string.to_string()
    } else {
        format!("sqlite://{}", connection_string)
    }
}

impl Opener for SqliteDialect {
    fn connection_data(&self, engine: EngineConfig<'_>) -> StorageResult<ConnectionData> {
        let EngineConfig::Sqlite(info) = engine else {
            return Err(PersistenceError::config_can_not_be_loaded().with_message(format!(
                "invalid config to open a connection to sqlite [{:?}]",
                engine
            )));
        };
        if info.connection_string.trim().is_empty() {
            return Err(PersistenceError::config_can_not_be_loaded()
                .with_message("variable 'connection_string' cannot be empty"));
        }

        Ok(ConnectionData {
            driver: "sqlite".to_string(),
            connection_string: normalize_connection_string(&info.connection_string),
        })
    }

    fn connect<'a>(
        &'a self,
        data: &'a ConnectionData,
        params: &'a SqlClientParameters,
    ) -> BoxFuture<'a, StorageResult<AnyPool>> {
        Box::pin(async move {
            sqlx::any::install_default_drivers();
            let pool = pool_options(params)
                .connect(&data.connection_string)
                .await
                .map_err(|e| PersistenceError::permanent_connection().with_message(e.to_string()))?;
            self.session.set_pool(pool.clone());
            Ok(pool)
        })
    }
}

impl Migrator for SqliteDialect {
    fn open_connection(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.session.open())
    }

    fn init_migration<'a>(&'a self, table_prefix: Option<&'a str>) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.session.init(table_prefix))
    }

    fn get_migration_version(&self) -> BoxFuture<'_, Result<MigrationVersion>> {
        Box::pin(self.session.get_version())
    }

    fn set_migration_version(&self, version: MigrationVersion) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.session.set_version(version))
    }

    fn run_migration<'a>(&'a self, script: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.session.run(script))
    }

    fn close_connection(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.session.close())
    }
}

impl ErrorTranslator for SqliteDialect {
    fn translate_error(&self, err: &sqlx::Error, default: PersistenceError) -> PersistenceError {
        let Some(db_err) = err.as_database_error() else {
            return default;
        };
        // Extended result codes carry the primary code in the low byte.
        let primary = db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff);

        match primary.and_then(|code| self.error_map.get(&code)) {
            Some(mapped) => mapped.clone(),
            None => default,
        }
    }
}

impl Dialect for SqliteDialect {
    fn placeholder(&self, position: usize) -> String {
        sqlite_placeholder(position)
    }

    fn as_migrator(&self) -> &dyn Migrator {
        self
    }

    fn as_error_translator(&self) -> &dyn ErrorTranslator {
        self
    }
}
