//! PostgreSQL dialect.

use std::collections::HashMap;
use std::io;

use futures::future::BoxFuture;
use sqlx::AnyPool;
use url::Url;

use signet_core::config::{EngineConfig, PostgresInfo, SqlClientParameters};
use signet_core::error::Result;
use signet_core::storage::{PersistenceError, StorageResult};

use super::connection::pool_options;
use super::dialect::{ConnectionData, Dialect, ErrorTranslator, MigrationVersion, Migrator, Opener};
use super::session::{MigrationSession, SessionSql};

const APPLICATION_NAME: &str = "SIGNET";

pub struct PostgresDialect {
    error_map: HashMap<&'static str, PersistenceError>,
    session: MigrationSession,
}

impl PostgresDialect {
    pub fn new() -> Self {
        let mut error_map = HashMap::new();
        error_map.insert("23505", PersistenceError::already_exists());
        error_map.insert(
            "3D000",
            PersistenceError::transient_connection()
                .with_message("couldn't find the given table in the PostgreSQL server"),
        );
        error_map.insert(
            "28P01",
            PersistenceError::permanent_connection().with_message("forbidden access"),
        );

        Self {
            error_map,
            session: MigrationSession::new(SessionSql {
                clear_table: "TRUNCATE",
                placeholder: postgres_placeholder,
            }),
        }
    }

    /// Classify a failure to open the pool.
    fn translate_connection_error(&self, err: &sqlx::Error) -> PersistenceError {
        match err {
            sqlx::Error::Io(io_err) => match io_err.kind() {
                io::ErrorKind::ConnectionRefused => PersistenceError::transient_connection()
                    .with_message("PostgreSQL server not found in given port"),
                io::ErrorKind::TimedOut
                | io::ErrorKind::Interrupted
                | io::ErrorKind::WouldBlock
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected => {
                    PersistenceError::transient_connection().with_message(err.to_string())
                }
                _ => PersistenceError::permanent_connection().with_message(err.to_string()),
            },
            sqlx::Error::PoolTimedOut => {
                PersistenceError::transient_connection().with_message(err.to_string())
            }
            _ => self.translate_error(
                err,
                PersistenceError::permanent_connection().with_message(err.to_string()),
            ),
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

fn postgres_placeholder(position: usize) -> String {
    format!("${}", position)
}

fn build_connection_string(info: &PostgresInfo) -> StorageResult<String> {
    let invalid =
        |message: String| PersistenceError::config_can_not_be_loaded().with_message(message);

    if info.username.is_empty() {
        return Err(invalid("variable 'username' cannot be empty".into()));
    }
    if info.host.is_empty() {
        return Err(invalid("variable 'host' cannot be empty".into()));
    }
    if info.port == 0 {
        return Err(invalid("variable 'port' cannot be empty".into()));
    }
    if info.database.is_empty() {
        return Err(invalid("variable 'database' cannot be empty".into()));
    }
    if info.ssl_mode.is_empty() {
        return Err(invalid("variable 'ssl_mode' cannot be empty".into()));
    }
    if info.scheme != "postgres" && info.scheme != "postgresql" {
        return Err(invalid(format!(
            "unsupported scheme [{}], expected postgres or postgresql",
            info.scheme
        )));
    }

    let mut url = Url::parse(&format!("{}://{}", info.scheme, info.host))
        .map_err(|e| invalid(format!("invalid postgres host [{}]: {}", info.host, e)))?;
    url.set_port(Some(info.port))
        .map_err(|_| invalid("invalid postgres port".into()))?;
    url.set_username(&info.username)
        .map_err(|_| invalid("invalid postgres username".into()))?;
    if !info.password.is_empty() {
        url.set_password(Some(&info.password))
            .map_err(|_| invalid("invalid postgres password".into()))?;
    }
    url.set_path(&info.database);
    url.query_pairs_mut()
        .append_pair("application_name", APPLICATION_NAME)
        .append_pair("sslmode", &info.ssl_mode);

    Ok(url.to_string())
}

impl Opener for PostgresDialect {
    fn connection_data(&self, engine: EngineConfig<'_>) -> StorageResult<ConnectionData> {
        let EngineConfig::Postgres(info) = engine else {
            return Err(PersistenceError::config_can_not_be_loaded().with_message(format!(
                "invalid config to open a connection to postgres [{:?}]",
                engine
            )));
        };

        Ok(ConnectionData {
            driver: "postgres".to_string(),
            connection_string: build_connection_string(info)?,
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
                .map_err(|e| self.translate_connection_error(&e))?;
            self.session.set_pool(pool.clone());
            Ok(pool)
        })
    }
}

impl Migrator for PostgresDialect {
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

impl ErrorTranslator for PostgresDialect {
    fn translate_error(&self, err: &sqlx::Error, default: PersistenceError) -> PersistenceError {
        if let sqlx::Error::Database(db_err) = err {
            if let Some(code) = db_err.code() {
                if let Some(mapped) = self.error_map.get(&*code) {
                    return mapped.clone();
                }
            }
        }
        default
    }
}

impl Dialect for PostgresDialect {
    fn placeholder(&self, position: usize) -> String {
        postgres_placeholder(position)
    }

    fn as_migrator(&self) -> &dyn Migrator {
        self
    }

    fn as_error_translator(&self) -> &dyn ErrorTranslator {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> PostgresInfo {
        PostgresInfo {
            host: "localhost".into(),
            port: 5432,
            scheme: "postgres".into(),
            username: "signet".into(),
            password: "p@ss word".into(),
            ssl_mode: "disable".into(),
            database: "signet".into(),
        }
    }

    #[test]
    fn test_connection_data() {
        let dialect = PostgresDialect::new();
        let data = dialect
            .connection_data(EngineConfig::Postgres(&info()))
            .unwrap();
        assert_eq!(data.driver, "postgres");

        let url = Url::parse(&data.connection_string).unwrap();
        assert_eq!(url.scheme(), "postgres");
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(5432));
        assert_eq!(url.username(), "signet");
        assert_eq!(url.path(), "/signet");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("sslmode".into(), "disable".into())));
        assert!(query.contains(&("application_name".into(), "SIGNET".into())));
    }

    #[test]
    fn test_connection_data_requires_fields() {
        let dialect = PostgresDialect::new();
        for mutate in [
            (|i: &mut PostgresInfo| i.username.clear()) as fn(&mut PostgresInfo),
            |i: &mut PostgresInfo| i.host.clear(),
            |i: &mut PostgresInfo| i.port = 0,
            |i: &mut PostgresInfo| i.database.clear(),
            |i: &mut PostgresInfo| i.ssl_mode.clear(),
            |i: &mut PostgresInfo| i.scheme = "mysql".into(),
        ] {
            let mut info = info();
            mutate(&mut info);
            let err = dialect
                .connection_data(EngineConfig::Postgres(&info))
                .unwrap_err();
            assert!(err.is_config_can_not_be_loaded(), "{}", err);
        }
    }

    #[test]
    fn test_connection_data_rejects_other_engine() {
        let dialect = PostgresDialect::new();
        let sqlite = signet_core::config::SqliteInfo {
            connection_string: "sqlite::memory:".into(),
        };
        assert!(dialect.connection_data(EngineConfig::Sqlite(&sqlite)).is_err());
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(PostgresDialect::new().placeholder(3), "$3");
    }

    #[test]
    fn test_translate_unknown_error_returns_default() {
        let dialect = PostgresDialect::new();
        let default = PersistenceError::statement_execution_failed().with_message("boom");
        let translated = dialect.translate_error(&sqlx::Error::RowNotFound, default.clone());
        assert_eq!(translated, default);
    }

    #[test]
    fn test_refused_connection_is_transient() {
        let dialect = PostgresDialect::new();
        let err = sqlx::Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        let translated = dialect.translate_connection_error(&err);
        assert!(translated.is_transient_connection_error());
        assert_eq!(
            translated.message(),
            Some("PostgreSQL server not found in given port")
        );
    }

    #[test]
    fn test_other_io_error_is_permanent() {
        let dialect = PostgresDialect::new();
        let err = sqlx::Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let translated = dialect.translate_connection_error(&err);
        assert_eq!(translated.kind(), signet_core::storage::ErrorKind::PermanentConnectionError);
        assert!(dialect
            .translate_connection_error(&sqlx::Error::PoolTimedOut)
            .is_transient_connection_error());
    }
}
