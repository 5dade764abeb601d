//! Templated persistence engine.
//!
//! A call resolves the statement id, renders the statement template against
//! the serialized arguments, compiles `:name` references into the dialect's
//! placeholders, prepares the result on the context's transaction (or the
//! pool) and executes it. Driver errors are translated by the dialect.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use sqlx::any::{AnyRow, AnyStatement};
use sqlx::{Any, Executor, FromRow, Statement as _, Transaction};
use tracing::{debug, warn};

use signet_core::storage::{
    ExecuteOutput, PersistenceError, Storage, StorageConfig, StorageContext, StorageResult,
};

use super::connection::Connection;
use super::named::{bind_values, compile_named, resolve_values};
use super::template::StatementRenderer;

/// Options to build a [`Fw`].
pub struct FwOptions {
    pub connection: Arc<Connection>,
    /// Statements slower than this are logged at warn level.
    pub slow_statement_threshold: Option<Duration>,
}

/// Persistence engine implementing [`Storage`].
pub struct Fw {
    connection: Arc<Connection>,
    config: StorageConfig,
    renderer: StatementRenderer,
    slow_statement_threshold: Option<Duration>,
}

/// A statement ready to be prepared.
struct RenderedStatement {
    sql: String,
    values: Vec<Value>,
}

impl Fw {
    pub fn new(options: FwOptions) -> Self {
        Self {
            connection: options.connection,
            config: StorageConfig::empty(),
            renderer: StatementRenderer::new(),
            slow_statement_threshold: options.slow_statement_threshold,
        }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn render<A>(&self, stmt_id: &str, args: &A) -> StorageResult<RenderedStatement>
    where
        A: Serialize + ?Sized,
    {
        let statement = self.config.get_statement(stmt_id).ok_or_else(|| {
            PersistenceError::statement_could_not_be_prepared()
                .with_message(format!("statement with id [{}] not found", stmt_id))
        })?;

        let args = serde_json::to_value(args).map_err(|e| {
            PersistenceError::statement_could_not_be_prepared().with_message(format!(
                "arguments of statement id '{}' can not be serialized: {}",
                stmt_id, e
            ))
        })?;

        let rendered = self.renderer.render(stmt_id, &statement.content, &args)?;
        let dialect = self.connection.dialect();
        let compiled = compile_named(&rendered, |n| dialect.placeholder(n));
        let values = resolve_values(&args, &compiled.names).map_err(|e| {
            PersistenceError::statement_could_not_be_prepared().with_message(format!(
                "statement id '{}' ({}) error: {}",
                stmt_id,
                compiled.sql,
                e.message().unwrap_or_default()
            ))
        })?;

        Ok(RenderedStatement {
            sql: compiled.sql,
            values,
        })
    }

    async fn prepare<'q>(
        &self,
        tx: Option<&mut Transaction<'static, Any>>,
        stmt_id: &str,
        sql: &'q str,
    ) -> StorageResult<AnyStatement<'q>> {
        let prepared = match tx {
            Some(tx) => (&mut **tx).prepare(sql).await,
            None => self.connection.pool().prepare(sql).await,
        };
        prepared.map_err(|e| {
            PersistenceError::statement_could_not_be_prepared()
                .with_message(format!("statement id '{}' ({}) error: {}", stmt_id, sql, e))
        })
    }

    fn execution_error(&self, stmt_id: &str, sql: &str, err: sqlx::Error) -> PersistenceError {
        let default = PersistenceError::statement_execution_failed()
            .with_message(format!("statement id '{}' ({}) error: {}", stmt_id, sql, err));
        self.connection
            .error_translator()
            .translate_error(&err, default)
    }

    fn record_timing(&self, stmt_id: &str, started: Instant) {
        let elapsed = started.elapsed();
        debug!("Statement {} executed in {:?}", stmt_id, elapsed);
        if let Some(threshold) = self.slow_statement_threshold {
            if elapsed > threshold {
                warn!(
                    "Slow statement {}: {:?} (threshold {:?})",
                    stmt_id, elapsed, threshold
                );
            }
        }
    }
}

impl Storage for Fw {
    async fn query_all<A, T>(
        &self,
        ctx: &mut StorageContext,
        stmt_id: &str,
        args: &A,
    ) -> StorageResult<Vec<T>>
    where
        A: Serialize + Sync + ?Sized,
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let rendered = self.render(stmt_id, args)?;
        let started = Instant::now();

        let statement = self
            .prepare(ctx.transaction_mut(), stmt_id, &rendered.sql)
            .await?;
        let query = bind_values(statement.query(), &rendered.values);
        let rows = match ctx.transaction_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(self.connection.pool()).await,
        }
        .map_err(|e| self.execution_error(stmt_id, &rendered.sql, e))?;

        self.record_timing(stmt_id, started);

        rows.iter()
            .map(|row| {
                T::from_row(row).map_err(|e| {
                    PersistenceError::db_response_can_not_be_processed().with_message(format!(
                        "row could not be processed. Statement id '{}' ({}) error: {}",
                        stmt_id, rendered.sql, e
                    ))
                })
            })
            .collect()
    }

    async fn execute_stmt<A>(
        &self,
        ctx: &mut StorageContext,
        stmt_id: &str,
        args: &A,
    ) -> StorageResult<()>
    where
        A: Serialize + Sync + ?Sized,
    {
        self.execute_stmt_with_storage_result(ctx, stmt_id, args)
            .await
            .map(|_| ())
    }

    async fn execute_stmt_with_storage_result<A>(
        &self,
        ctx: &mut StorageContext,
        stmt_id: &str,
        args: &A,
    ) -> StorageResult<ExecuteOutput>
    where
        A: Serialize + Sync + ?Sized,
    {
        let rendered = self.render(stmt_id, args)?;
        let started = Instant::now();

        let statement = self
            .prepare(ctx.transaction_mut(), stmt_id, &rendered.sql)
            .await?;
        let query = bind_values(statement.query(), &rendered.values);
        let result = match ctx.transaction_mut() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(self.connection.pool()).await,
        }
        .map_err(|e| self.execution_error(stmt_id, &rendered.sql, e))?;

        self.record_timing(stmt_id, started);

        Ok(ExecuteOutput {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    async fn begin_transaction(&self, ctx: &mut StorageContext) -> StorageResult<()> {
        if ctx.in_transaction() {
            return Err(PersistenceError::can_not_begin_transaction()
                .with_message("transaction already exists"));
        }

        let tx = self.connection.pool().begin().await.map_err(|e| {
            PersistenceError::can_not_begin_transaction().with_message(e.to_string())
        })?;

        if ctx.attach(tx).is_err() {
            return Err(PersistenceError::can_not_begin_transaction()
                .with_message("transaction already exists"));
        }
        debug!("Transaction started");
        Ok(())
    }

    async fn commit_transaction(&self, ctx: &mut StorageContext) -> StorageResult<()> {
        let tx = ctx.take().ok_or_else(PersistenceError::tx_not_in_context)?;

        if let Err(e) = tx.commit().await {
            ctx.clear_after_commit_hooks();
            return Err(PersistenceError::can_not_commit_transaction().with_message(e.to_string()));
        }
        debug!("Transaction committed");

        for hook in ctx.take_after_commit_hooks() {
            hook().await;
        }
        Ok(())
    }

    async fn rollback_transaction(&self, ctx: &mut StorageContext) -> StorageResult<()> {
        let tx = ctx.take().ok_or_else(PersistenceError::tx_not_in_context)?;
        ctx.clear_after_commit_hooks();

        tx.rollback().await.map_err(|e| {
            PersistenceError::can_not_rollback_transaction().with_message(e.to_string())
        })?;
        debug!("Transaction rolled back");
        Ok(())
    }

    fn get_transaction<'c>(
        &self,
        ctx: &'c mut StorageContext,
    ) -> StorageResult<&'c mut Transaction<'static, Any>> {
        ctx.transaction_mut()
            .ok_or_else(PersistenceError::tx_not_in_context)
    }

    fn add_config(&mut self, config: StorageConfig) -> StorageResult<()> {
        self.config.add_config(config)
    }
}
