use thiserror::Error;

use crate::storage::PersistenceError;

/// Core error type for signet operations that are not tied to a single
/// statement execution (bootstrap, configuration, migrations).
#[derive(Error, Debug)]
pub enum SignetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("migration table is dirty in version [{version}]")]
    DirtyMigration { version: i64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for SignetError {
    fn from(e: serde_json::Error) -> Self {
        SignetError::Serialization(e.to_string())
    }
}

/// Result type alias using SignetError.
pub type Result<T> = std::result::Result<T, SignetError>;
