use rust_embed::RustEmbed;
use signet_core::fs::EmbeddedFs;

/// Migration manifests, scripts and statement mappers shipped with the binary.
///
/// Paths keep their `include/` prefix so the default `schemas_path` and
/// `mappers_path` resolve unchanged.
#[derive(RustEmbed)]
#[folder = "include/"]
#[prefix = "include/"]
pub struct Assets;

/// File system view over [`Assets`].
pub fn embedded_fs() -> EmbeddedFs<Assets> {
    EmbeddedFs::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_core::fs::ReadDirAndFileFs;

    #[test]
    fn test_manifests_are_embedded() {
        let fs = embedded_fs();
        for dialect in ["postgres", "sqlite"] {
            let manifest = fs
                .read_file(&format!("include/dbschemas/{}/db_migration_steps.yml", dialect))
                .unwrap();
            assert!(!manifest.is_empty());
        }
    }

    #[test]
    fn test_mappers_are_embedded() {
        let fs = embedded_fs();
        let entries = fs.read_dir("include/config/mappers/sqlite").unwrap();
        assert!(entries.iter().any(|e| e.name.ends_with(".xml")));
    }
}
