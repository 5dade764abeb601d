//! Storage abstraction shared by every repository.
//!
//! Repositories address statements by id (`"<mapper>.<statement>"`), pass a
//! serializable argument struct, and get typed rows back. Whether a call runs
//! inside a transaction is decided by the [`StorageContext`] it receives.

mod context;
mod errors;
mod filter;
mod statement;

pub use context::{AfterCommitHook, StorageContext};
pub use errors::{ErrorKind, PersistenceError, StorageResult};
pub use filter::{
    BetweenFilter, EqualFilter, Filter, FilterGroup, GreaterFilter, GreaterOrEqualFilter,
    LessFilter, LessOrEqualFilter, ListEqualFilter, ListFilter, Order, OrderByOption,
    OrderDirection, Pagination,
};
pub use statement::{StatementConfig, StorageConfig, StorageConfigOptions, DEFAULT_MAPPERS_PATH};

use std::future::Future;

use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::{Any, FromRow, Transaction};

/// Outcome of a data-modifying statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOutput {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// Templated statement execution with context-scoped transactions.
pub trait Storage: Send + Sync {
    /// Run a row-returning statement and decode every row into `T`.
    fn query_all<A, T>(
        &self,
        ctx: &mut StorageContext,
        stmt_id: &str,
        args: &A,
    ) -> impl Future<Output = StorageResult<Vec<T>>> + Send
    where
        A: Serialize + Sync + ?Sized,
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin;

    /// Run a statement, discarding its result.
    fn execute_stmt<A>(
        &self,
        ctx: &mut StorageContext,
        stmt_id: &str,
        args: &A,
    ) -> impl Future<Output = StorageResult<()>> + Send
    where
        A: Serialize + Sync + ?Sized;

    /// Run a statement and report affected rows.
    fn execute_stmt_with_storage_result<A>(
        &self,
        ctx: &mut StorageContext,
        stmt_id: &str,
        args: &A,
    ) -> impl Future<Output = StorageResult<ExecuteOutput>> + Send
    where
        A: Serialize + Sync + ?Sized;

    /// Open a transaction and attach it to `ctx`.
    fn begin_transaction(
        &self,
        ctx: &mut StorageContext,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    fn commit_transaction(
        &self,
        ctx: &mut StorageContext,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    fn rollback_transaction(
        &self,
        ctx: &mut StorageContext,
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// The transaction attached to `ctx`.
    fn get_transaction<'c>(
        &self,
        ctx: &'c mut StorageContext,
    ) -> StorageResult<&'c mut Transaction<'static, Any>>;

    /// Register more statements. Fails on any id collision.
    fn add_config(&mut self, config: StorageConfig) -> StorageResult<()>;
}
