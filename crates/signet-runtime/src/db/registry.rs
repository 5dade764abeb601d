use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use signet_core::error::{Result, SignetError};

use super::dialect::Dialect;
use super::postgres::PostgresDialect;
use super::sqlite::SqliteDialect;

/// Registry of database dialects, keyed by name.
///
/// Written during startup, read afterwards.
#[derive(Default)]
pub struct DialectRegistry {
    dialects: RwLock<HashMap<String, Arc<dyn Dialect>>>,
}

impl DialectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            dialects: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with the `postgres` and `sqlite` dialects.
    pub fn with_builtin_dialects() -> Self {
        let registry = Self::new();
        registry.register("postgres", Arc::new(PostgresDialect::new()));
        registry.register("sqlite", Arc::new(SqliteDialect::new()));
        registry
    }

    /// Register a dialect.
    ///
    /// # Panics
    ///
    /// Panics if a dialect with the same name is already registered.
    pub fn register(&self, name: &str, dialect: Arc<dyn Dialect>) {
        if let Err(e) = self.try_register(name, dialect) {
            panic!("{}", e);
        }
    }

    /// Register a dialect, failing on a duplicate name.
    pub fn try_register(&self, name: &str, dialect: Arc<dyn Dialect>) -> Result<()> {
        let mut dialects = self.dialects.write();
        if dialects.contains_key(name) {
            return Err(SignetError::Config(format!(
                "dialect [{}] is already registered",
                name
            )));
        }
        dialects.insert(name.to_string(), dialect);
        Ok(())
    }

    /// Get a dialect by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.read().get(name).cloned()
    }

    /// Get all dialect names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dialects.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.dialects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_dialects() {
        let registry = DialectRegistry::with_builtin_dialects();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["postgres", "sqlite"]);
        assert_eq!(registry.get("postgres").unwrap().placeholder(1), "$1");
        assert_eq!(registry.get("sqlite").unwrap().placeholder(2), "?2");
        assert!(registry.get("mysql").is_none());
    }

    #[test]
    fn test_try_register_duplicate() {
        let registry = DialectRegistry::new();
        assert!(registry.is_empty());
        registry
            .try_register("sqlite", Arc::new(SqliteDialect::new()))
            .unwrap();
        let err = registry
            .try_register("sqlite", Arc::new(SqliteDialect::new()))
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "dialect [postgres] is already registered")]
    fn test_register_duplicate_panics() {
        let registry = DialectRegistry::with_builtin_dialects();
        registry.register("postgres", Arc::new(PostgresDialect::new()));
    }
}
