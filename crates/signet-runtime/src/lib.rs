pub mod db;
pub mod migrations;
pub mod observability;

pub use db::{Connection, DialectRegistry, Fw, FwOptions, TransactionalManager};
pub use migrations::{DbMigrator, MigrateFromFilesInput, Migration, MigrationStep};
