use std::sync::Arc;
use std::time::Duration;

use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use tracing::info;

use signet_core::config::{DatabaseConfig, SqlClientParameters};
use signet_core::error::{Result, SignetError};

use super::dialect::{Dialect, ErrorTranslator, Migrator};
use super::registry::DialectRegistry;

/// Pooled database handle bound to the dialect that opened it.
#[derive(Clone)]
pub struct Connection {
    pool: AnyPool,
    dialect: Arc<dyn Dialect>,
    dialect_name: String,
}

impl Connection {
    /// Open the engine configured in `config` with the matching dialect.
    pub async fn new(registry: &DialectRegistry, config: &DatabaseConfig) -> Result<Self> {
        let engine = config.engine()?;
        let dialect_name = engine.dialect_name();

        let dialect = registry.get(dialect_name).ok_or_else(|| {
            SignetError::Config(format!("dialect [{}] is not supported", dialect_name))
        })?;

        let data = dialect.connection_data(engine)?;
        let pool = dialect.connect(&data, &config.sql_client).await?;

        info!("Connected to {} database", dialect_name);

        Ok(Self {
            pool,
            dialect,
            dialect_name: dialect_name.to_string(),
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn dialect_name(&self) -> &str {
        &self.dialect_name
    }

    pub fn migrator(&self) -> &dyn Migrator {
        self.dialect.as_migrator()
    }

    pub fn error_translator(&self) -> &dyn ErrorTranslator {
        self.dialect.as_error_translator()
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| SignetError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("dialect_name", &self.dialect_name)
            .finish()
    }
}

/// Pool options derived from the client parameters.
pub(crate) fn pool_options(params: &SqlClientParameters) -> PoolOptions<Any> {
    let lifetime_ms = params.max_connection_lifetime_ms();
    let max_open = params.max_open_connections().max(1);
    PoolOptions::<Any>::new()
        .max_connections(max_open)
        .min_connections(params.max_idle_connections().min(max_open))
        .max_lifetime((lifetime_ms > 0).then(|| Duration::from_millis(lifetime_ms)))
}
