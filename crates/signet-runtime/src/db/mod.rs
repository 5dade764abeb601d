mod connection;
mod dialect;
mod fw;
mod named;
mod postgres;
mod registry;
mod session;
mod sqlite;
mod template;
mod transactional;

pub use connection::Connection;
pub use dialect::{ConnectionData, Dialect, ErrorTranslator, MigrationVersion, Migrator, Opener};
pub use fw::{Fw, FwOptions};
pub use postgres::PostgresDialect;
pub use registry::DialectRegistry;
pub use session::DEFAULT_MIGRATIONS_TABLE;
pub use sqlite::SqliteDialect;
pub use transactional::TransactionalManager;
