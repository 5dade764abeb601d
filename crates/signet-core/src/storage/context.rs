use futures::future::BoxFuture;
use sqlx::{Any, Transaction};

/// Callback queued to run once the enclosing transaction has committed.
pub type AfterCommitHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Per-request unit of work.
///
/// Carries at most one open transaction. Storage calls made with a context
/// holding a transaction run inside it; otherwise they run on the pool.
#[derive(Default)]
pub struct StorageContext {
    tx: Option<Transaction<'static, Any>>,
    after_commit: Vec<AfterCommitHook>,
}

impl StorageContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    pub fn transaction_mut(&mut self) -> Option<&mut Transaction<'static, Any>> {
        self.tx.as_mut()
    }

    /// Store a freshly started transaction. Returns it back if one is already held.
    pub fn attach(
        &mut self,
        tx: Transaction<'static, Any>,
    ) -> std::result::Result<(), Transaction<'static, Any>> {
        if self.tx.is_some() {
            return Err(tx);
        }
        self.tx = Some(tx);
        Ok(())
    }

    /// Remove the transaction so it can be committed or rolled back.
    pub fn take(&mut self) -> Option<Transaction<'static, Any>> {
        self.tx.take()
    }

    /// Queue a hook for after the current transaction commits.
    ///
    /// Returns `false` (and drops the hook) when no transaction is open.
    pub fn register_after_commit(&mut self, hook: AfterCommitHook) -> bool {
        if self.tx.is_none() {
            return false;
        }
        self.after_commit.push(hook);
        true
    }

    /// Drain queued hooks in registration order.
    pub fn take_after_commit_hooks(&mut self) -> Vec<AfterCommitHook> {
        std::mem::take(&mut self.after_commit)
    }

    pub fn clear_after_commit_hooks(&mut self) {
        self.after_commit.clear();
    }
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("in_transaction", &self.in_transaction())
            .field("after_commit_hooks", &self.after_commit.len())
            .finish()
    }
}
