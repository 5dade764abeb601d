#![allow(dead_code)]

use std::sync::Arc;

use serde::Serialize;
use tempfile::TempDir;

use signet_core::config::DatabaseConfig;
use signet_core::fs::MemoryFs;
use signet_core::storage::{StorageConfig, StorageConfigOptions};
use signet_runtime::db::{Connection, DialectRegistry, Fw, FwOptions};
use signet_runtime::migrations::{DbMigrator, MigrateFromFilesInput};

pub const ENTITY_MAPPER: &str = r#"<mapper id="ns">
    <statement id="insert">INSERT INTO test_entities (id, name, counter) VALUES (:id, :name, :counter)</statement>
    <statement id="getById">SELECT id, name, counter FROM test_entities WHERE id=:id</statement>
    <statement id="rename">UPDATE test_entities SET name=:name WHERE id=:id</statement>
    <statement id="delete">DELETE FROM test_entities WHERE id=:id</statement>
    <statement id="list">
        SELECT id, name, counter FROM test_entities
        {% if filter_group %}WHERE {{ filter_group.filters | join(' AND ') }}{% endif %}
        {% if order %}ORDER BY {{ order.by }} {{ order.direction }}{% endif %}
        {% if pagination %}LIMIT :pagination.limit OFFSET :pagination.offset{% endif %}
    </statement>
    <statement id="missingTable">SELECT id FROM not_a_table WHERE id=:id</statement>
</mapper>"#;

pub const ENTITY_MANIFEST: &str = "migration_steps:
  - up: /include/dbschemas/sqlite/1_entities.up.sql
    down: /include/dbschemas/sqlite/1_entities.down.sql
    version_description: test entities
";

/// Temporary SQLite database shared by one test.
pub struct TestDb {
    _dir: TempDir,
    pub registry: DialectRegistry,
    pub connection: Arc<Connection>,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("signet.db");
        let config = DatabaseConfig::sqlite(format!("sqlite://{}?mode=rwc", path.display()));

        let registry = DialectRegistry::with_builtin_dialects();
        let connection = Connection::new(&registry, &config)
            .await
            .expect("connect to sqlite");

        Self {
            _dir: dir,
            registry,
            connection: Arc::new(connection),
        }
    }

    pub fn migrator(&self) -> DbMigrator {
        DbMigrator::new(Arc::clone(&self.connection))
    }

    /// Engine with the `ns.*` statements and the entities table created.
    pub async fn fw(&self) -> Fw {
        let fs = MemoryFs::new()
            .with_file("include/dbschemas/sqlite/db_migration_steps.yml", ENTITY_MANIFEST)
            .with_file(
                "include/dbschemas/sqlite/1_entities.up.sql",
                "CREATE TABLE test_entities (id TEXT PRIMARY KEY, name TEXT NOT NULL, counter INTEGER NOT NULL);",
            )
            .with_file("include/dbschemas/sqlite/1_entities.down.sql", "DROP TABLE test_entities;")
            .with_file("include/config/mappers/sqlite/ns.xml", ENTITY_MAPPER);

        self.migrator()
            .migrate_from_files(MigrateFromFilesInput {
                fs: &fs,
                target_version: None,
                migrations_table_prefix: None,
                schemas_path: None,
            })
            .await
            .expect("create entities table");

        let mut fw = Fw::new(FwOptions {
            connection: Arc::clone(&self.connection),
            slow_statement_threshold: None,
        });
        let config = StorageConfig::new(StorageConfigOptions {
            fs: &fs,
            mappers_path: None,
            driver: self.connection.dialect_name(),
        })
        .expect("load mappers");
        signet_core::storage::Storage::add_config(&mut fw, config).expect("add mappers");
        fw
    }

    /// Values of a single-column text query, in row order.
    pub async fn strings(&self, sql: &str) -> Vec<String> {
        let rows: Vec<(String,)> = sqlx::query_as(sql)
            .fetch_all(self.connection.pool())
            .await
            .expect("query strings");
        rows.into_iter().map(|(value,)| value).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub counter: i64,
}

impl Entity {
    pub fn new(id: &str, name: &str, counter: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            counter,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ById {
    pub id: String,
}

impl ById {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}
