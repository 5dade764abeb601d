//! Migration manifest (`db_migration_steps.yml`).
//!
//! ```yaml
//! migration_steps:
//!   - up: /1_create_admins.up.sql
//!     down: /1_create_admins.down.sql
//!     version_description: admins table
//! ```

use figment::providers::{Format, Yaml};
use figment::Figment;
use serde::Deserialize;

use signet_core::error::{Result, SignetError};

/// File name of the manifest inside each dialect directory.
pub const MANIFEST_FILE_NAME: &str = "db_migration_steps.yml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MigrationManifest {
    pub migration_steps: Vec<ManifestStep>,
}

/// One manifest entry; `up` and `down` are paths relative to the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestStep {
    pub up: String,
    pub down: String,
    #[serde(default)]
    pub version_description: String,
}

impl MigrationManifest {
    pub fn parse_yaml(content: &str) -> Result<Self> {
        Figment::from(Yaml::string(content))
            .extract()
            .map_err(|e| SignetError::Migration(format!("invalid migration manifest: {}", e)))
    }
}

/// Strip a single leading `/` from a manifest path.
pub(crate) fn strip_leading_slash(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let yaml = r#"
migration_steps:
  - up: /1_admins.up.sql
    down: /1_admins.down.sql
    version_description: admins table
  - up: 2_users.up.sql
    down: 2_users.down.sql
"#;
        let manifest = MigrationManifest::parse_yaml(yaml).unwrap();
        assert_eq!(manifest.migration_steps.len(), 2);
        assert_eq!(manifest.migration_steps[0].up, "/1_admins.up.sql");
        assert_eq!(manifest.migration_steps[0].version_description, "admins table");
        assert_eq!(manifest.migration_steps[1].version_description, "");
    }

    #[test]
    fn test_parse_manifest_missing_steps() {
        let err = MigrationManifest::parse_yaml("other: 1").unwrap_err();
        assert!(matches!(err, SignetError::Migration(_)));
    }

    #[test]
    fn test_parse_manifest_missing_down() {
        let yaml = "migration_steps:\n  - up: 1.up.sql\n";
        assert!(MigrationManifest::parse_yaml(yaml).is_err());
    }

    #[test]
    fn test_strip_leading_slash() {
        assert_eq!(strip_leading_slash("/1.up.sql"), "1.up.sql");
        assert_eq!(strip_leading_slash("1.up.sql"), "1.up.sql");
        assert_eq!(strip_leading_slash("//1.up.sql"), "/1.up.sql");
    }
}
