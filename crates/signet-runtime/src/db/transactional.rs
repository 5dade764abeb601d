//! Unit-of-work helper on top of [`Storage`].

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use signet_core::storage::{AfterCommitHook, PersistenceError, Storage, StorageContext};

/// Runs closures inside a transaction, joining one that is already open.
pub struct TransactionalManager<S> {
    storage: Arc<S>,
}

impl<S> Clone for TransactionalManager<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage> TransactionalManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Run `f` inside a transaction.
    ///
    /// When `ctx` has no transaction one is started, committed if `f`
    /// succeeds and rolled back otherwise. When a transaction is already
    /// open, `f` joins it and the outermost caller decides its outcome.
    pub async fn execute_in_transaction<T, E, F>(
        &self,
        ctx: &mut StorageContext,
        f: F,
    ) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c S, &'c mut StorageContext) -> BoxFuture<'c, Result<T, E>>,
        E: From<PersistenceError>,
    {
        if ctx.in_transaction() {
            return f(self.storage.as_ref(), ctx).await;
        }

        self.storage.begin_transaction(ctx).await?;

        match f(self.storage.as_ref(), ctx).await {
            Ok(value) => {
                self.storage.commit_transaction(ctx).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.storage.rollback_transaction(ctx).await {
                    warn!("Failed to rollback transaction: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    /// Queue `hook` to run after the outermost transaction commits.
    ///
    /// Returns `false` when `ctx` holds no transaction.
    pub fn register_after_commit(&self, ctx: &mut StorageContext, hook: AfterCommitHook) -> bool {
        ctx.register_after_commit(hook)
    }
}
