mod manifest;
mod migrator;
mod plan;

pub use manifest::{ManifestStep, MigrationManifest, MANIFEST_FILE_NAME};
pub use migrator::{
    load_steps, DbMigrator, MigrateFromFilesInput, Migration, MigrationStep, DEFAULT_SCHEMAS_PATH,
};
