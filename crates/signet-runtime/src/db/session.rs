//! Dedicated-connection state shared by the built-in dialects' migration
//! primitives.

use parking_lot::RwLock;
use sqlx::{AnyConnection, AnyPool, Connection as _, Executor as _, Row};
use tokio::sync::Mutex;
use tracing::debug;

use signet_core::error::{Result, SignetError};

use super::dialect::MigrationVersion;

/// Name of the migrations table when no prefix is configured.
pub const DEFAULT_MIGRATIONS_TABLE: &str = "signet_migrations";

/// Engine-specific SQL used by a [`MigrationSession`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionSql {
    /// Statement prefix that empties the table, e.g. `TRUNCATE`.
    pub clear_table: &'static str,
    /// Positional placeholder generator.
    pub placeholder: fn(usize) -> String,
}

pub(crate) struct MigrationSession {
    sql: SessionSql,
    pool: RwLock<Option<AnyPool>>,
    conn: Mutex<Option<AnyConnection>>,
    table: RwLock<Option<String>>,
}

impl MigrationSession {
    pub fn new(sql: SessionSql) -> Self {
        Self {
            sql,
            pool: RwLock::new(None),
            conn: Mutex::new(None),
            table: RwLock::new(None),
        }
    }

    pub fn set_pool(&self, pool: AnyPool) {
        *self.pool.write() = Some(pool);
    }

    fn pool(&self) -> Result<AnyPool> {
        self.pool
            .read()
            .clone()
            .ok_or_else(|| SignetError::Database("you must first connect to a db".into()))
    }

    fn table(&self) -> Result<String> {
        self.table.read().clone().ok_or_else(|| {
            SignetError::Migration(
                "migrations table not initialised, call init_migration first".into(),
            )
        })
    }

    pub async fn open(&self) -> Result<()> {
        let pool = self.pool()?;
        let conn = pool.acquire().await?.detach();

        let previous = self.conn.lock().await.replace(conn);
        if let Some(previous) = previous {
            previous.close().await?;
        }
        debug!("Dedicated migration connection opened");
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().await.take();
        if let Some(conn) = conn {
            conn.close().await?;
            debug!("Dedicated migration connection closed");
        }
        Ok(())
    }

    pub async fn init(&self, table_prefix: Option<&str>) -> Result<()> {
        self.pool()?;
        let table = migrations_table_name(table_prefix)?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_open)?;

        let query = format!(
            "CREATE TABLE IF NOT EXISTS {} (version bigint not null primary key, dirty boolean not null, description text)",
            table
        );
        sqlx::query(&query).execute(&mut *conn).await?;

        *self.table.write() = Some(table);
        Ok(())
    }

    pub async fn get_version(&self) -> Result<MigrationVersion> {
        self.pool()?;
        let table = self.table()?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_open)?;

        // The dirty flag is read back as an integer so every engine decodes it
        // the same way.
        let query = format!(
            "SELECT version, CAST(CASE WHEN dirty THEN 1 ELSE 0 END AS BIGINT) AS dirty, description FROM {} LIMIT 1",
            table
        );
        let row = sqlx::query(&query).fetch_optional(&mut *conn).await?;

        let Some(row) = row else {
            return Ok(MigrationVersion::default());
        };

        let version: i64 = row.try_get(0)?;
        let dirty: i64 = row.try_get(1)?;
        let description: Option<String> = row.try_get(2)?;

        Ok(MigrationVersion {
            version,
            dirty: dirty != 0,
            description: description.unwrap_or_default(),
        })
    }

    pub async fn set_version(&self, version: MigrationVersion) -> Result<()> {
        self.pool()?;
        let table = self.table()?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_open)?;

        // Dropping the transaction on an early return rolls it back.
        let mut tx = conn.begin().await?;

        let clear = format!("{} {}", self.sql.clear_table, table);
        sqlx::query(&clear).execute(&mut *tx).await?;

        let placeholder = self.sql.placeholder;
        let insert = format!(
            "INSERT INTO {} (version, dirty, description) VALUES ({}, {}, {})",
            table,
            placeholder(1),
            placeholder(2),
            placeholder(3)
        );
        sqlx::query(&insert)
            .bind(version.version)
            .bind(version.dirty)
            .bind(version.description)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Execute `script` as a whole on the dedicated connection, outside any
    /// transaction. Multi-statement scripts and trigger bodies are passed to
    /// the engine untouched.
    pub async fn run(&self, script: &str) -> Result<()> {
        self.pool()?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_open)?;

        if script.trim().is_empty() {
            return Ok(());
        }

        (&mut *conn)
            .execute(script)
            .await
            .map_err(|e| SignetError::Migration(format!("migration script failed: {}", e)))?;
        Ok(())
    }
}

fn not_open() -> SignetError {
    SignetError::Database("you must first open a connection to a db".into())
}

/// `<prefix>_signet_migrations`, or the default table without a prefix.
pub(crate) fn migrations_table_name(prefix: Option<&str>) -> Result<String> {
    match prefix {
        None => Ok(DEFAULT_MIGRATIONS_TABLE.to_string()),
        Some(prefix) => {
            if prefix.is_empty()
                || !prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(SignetError::InvalidArgument(format!(
                    "invalid migrations table prefix [{}]",
                    prefix
                )));
            }
            Ok(format!("{}_{}", prefix, DEFAULT_MIGRATIONS_TABLE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql() -> SessionSql {
        SessionSql {
            clear_table: "DELETE FROM",
            placeholder: |n| format!("?{}", n),
        }
    }

    #[test]
    fn test_table_name() {
        assert_eq!(migrations_table_name(None).unwrap(), "signet_migrations");
        assert_eq!(
            migrations_table_name(Some("hsm")).unwrap(),
            "hsm_signet_migrations"
        );
        assert!(migrations_table_name(Some("bad name;")).is_err());
        assert!(migrations_table_name(Some("")).is_err());
    }

    #[tokio::test]
    async fn test_requires_pool() {
        let session = MigrationSession::new(sql());
        let err = session.open().await.unwrap_err();
        assert_eq!(err.to_string(), "Database error: you must first connect to a db");
        let err = session.init(None).await.unwrap_err();
        assert!(err.to_string().contains("you must first connect to a db"));
    }

    #[tokio::test]
    async fn test_close_without_open_is_noop() {
        let session = MigrationSession::new(sql());
        session.close().await.unwrap();
    }
}
