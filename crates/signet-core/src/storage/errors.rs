//! Persistence error taxonomy.
//!
//! Every failure surfaced by a [`Storage`](super::Storage) implementation is a
//! [`PersistenceError`]. Callers classify it through [`PersistenceError::kind`]
//! or the `is_*` helpers, never by matching on the rendered text.

use std::fmt;

use thiserror::Error;

/// Classification of a persistence failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigCanNotBeLoaded,
    StatementCouldNotBePrepared,
    StatementExecutionFailed,
    DBResponseCanNotBeProcessed,
    CanNotBeginTransaction,
    CanNotRollbackTransaction,
    CanNotCommitTransaction,
    AlreadyExists,
    NotFound,
    TxNotInContext,
    EntryNotAdded,
    PermanentConnectionError,
    TransientConnectionError,
}

impl ErrorKind {
    /// Base description rendered for this kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ConfigCanNotBeLoaded => "configuration can not be loaded",
            Self::StatementCouldNotBePrepared => "statement could not be prepared for execution",
            Self::StatementExecutionFailed => "statement execution failed",
            Self::DBResponseCanNotBeProcessed => "can not process database response",
            Self::CanNotBeginTransaction => "can not begin transaction",
            Self::CanNotRollbackTransaction => "can not rollback transaction",
            Self::CanNotCommitTransaction => "can not commit transaction",
            Self::AlreadyExists => "already exists",
            Self::NotFound => "resource not found",
            Self::TxNotInContext => "transaction not in context",
            Self::EntryNotAdded => "entry not added",
            Self::PermanentConnectionError => "connection cannot be executed",
            Self::TransientConnectionError => {
                "connection failed but could be executed in the future"
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A classified persistence failure with an optional detail message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render(.kind, .message))]
pub struct PersistenceError {
    kind: ErrorKind,
    message: Option<String>,
}

fn render(kind: &ErrorKind, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("{}: {}", kind.description(), message),
        None => kind.description().to_string(),
    }
}

impl PersistenceError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Attach (or replace) the detail message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn config_can_not_be_loaded() -> Self {
        Self::new(ErrorKind::ConfigCanNotBeLoaded)
    }

    pub fn statement_could_not_be_prepared() -> Self {
        Self::new(ErrorKind::StatementCouldNotBePrepared)
    }

    pub fn statement_execution_failed() -> Self {
        Self::new(ErrorKind::StatementExecutionFailed)
    }

    pub fn db_response_can_not_be_processed() -> Self {
        Self::new(ErrorKind::DBResponseCanNotBeProcessed)
    }

    pub fn can_not_begin_transaction() -> Self {
        Self::new(ErrorKind::CanNotBeginTransaction)
    }

    pub fn can_not_rollback_transaction() -> Self {
        Self::new(ErrorKind::CanNotRollbackTransaction)
    }

    pub fn can_not_commit_transaction() -> Self {
        Self::new(ErrorKind::CanNotCommitTransaction)
    }

    pub fn already_exists() -> Self {
        Self::new(ErrorKind::AlreadyExists)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    pub fn tx_not_in_context() -> Self {
        Self::new(ErrorKind::TxNotInContext)
    }

    pub fn entry_not_added() -> Self {
        Self::new(ErrorKind::EntryNotAdded)
    }

    pub fn permanent_connection() -> Self {
        Self::new(ErrorKind::PermanentConnectionError)
    }

    pub fn transient_connection() -> Self {
        Self::new(ErrorKind::TransientConnectionError)
    }

    pub fn is_config_can_not_be_loaded(&self) -> bool {
        self.kind == ErrorKind::ConfigCanNotBeLoaded
    }

    pub fn is_statement_could_not_be_prepared(&self) -> bool {
        self.kind == ErrorKind::StatementCouldNotBePrepared
    }

    pub fn is_statement_execution_failed(&self) -> bool {
        self.kind == ErrorKind::StatementExecutionFailed
    }

    pub fn is_db_response_can_not_be_processed(&self) -> bool {
        self.kind == ErrorKind::DBResponseCanNotBeProcessed
    }

    pub fn is_can_not_begin_transaction(&self) -> bool {
        self.kind == ErrorKind::CanNotBeginTransaction
    }

    pub fn is_can_not_rollback_transaction(&self) -> bool {
        self.kind == ErrorKind::CanNotRollbackTransaction
    }

    pub fn is_can_not_commit_transaction(&self) -> bool {
        self.kind == ErrorKind::CanNotCommitTransaction
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_tx_not_in_context(&self) -> bool {
        self.kind == ErrorKind::TxNotInContext
    }

    pub fn is_entry_not_added(&self) -> bool {
        self.kind == ErrorKind::EntryNotAdded
    }

    /// Transient and permanent connection failures both count here.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::PermanentConnectionError | ErrorKind::TransientConnectionError
        )
    }

    pub fn is_transient_connection_error(&self) -> bool {
        self.kind == ErrorKind::TransientConnectionError
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, PersistenceError>;
