pub mod config;
pub mod error;
pub mod fs;
pub mod storage;

pub use config::{DatabaseConfig, EngineConfig, LoggingConfig, MigrationsConfig, SignetConfig};
pub use error::{Result, SignetError};
pub use fs::{DirEntry, DirFs, EmbeddedFs, MemoryFs, ReadDirAndFileFs};
pub use storage::{
    ExecuteOutput, PersistenceError, Storage, StorageConfig, StorageContext, StorageResult,
};
