//! Statement configuration loaded from XML mapper files.
//!
//! A mapper file looks like:
//!
//! ```xml
//! <mapper id="admin">
//!     <statement id="insert">
//!         INSERT INTO admins (id, role) VALUES (:id, :role)
//!     </statement>
//! </mapper>
//! ```
//!
//! Each statement is registered under `"<mapper id>.<statement id>"`.

use std::collections::HashMap;

use serde::Deserialize;

use super::errors::{PersistenceError, StorageResult};
use crate::fs::ReadDirAndFileFs;

/// Default location of the mapper files inside the file system.
pub const DEFAULT_MAPPERS_PATH: &str = "include/config/mappers";

/// A single templated statement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatementConfig {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "$text", default)]
    pub content: String,
}

/// The root element of a mapper file.
#[derive(Debug, Deserialize)]
struct MapperConfig {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "statement", default)]
    statements: Vec<StatementConfig>,
}

/// Options to load a [`StorageConfig`].
pub struct StorageConfigOptions<'a> {
    pub fs: &'a dyn ReadDirAndFileFs,
    /// Root of the mapper tree; defaults to [`DEFAULT_MAPPERS_PATH`] when empty.
    pub mappers_path: Option<&'a str>,
    /// Dialect name; selects the `<mappers_path>/<driver>` sub-directory.
    pub driver: &'a str,
}

/// Flat map from statement id to statement.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    data_map: HashMap<String, StatementConfig>,
}

impl StorageConfig {
    /// Load every `*.xml` file located directly under `<mappers_path>/<driver>`.
    pub fn new(options: StorageConfigOptions<'_>) -> StorageResult<Self> {
        let mappers_path = options
            .mappers_path
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_MAPPERS_PATH);
        let dir = join_path(mappers_path, options.driver);

        let entries = options.fs.read_dir(&dir).map_err(|e| {
            PersistenceError::config_can_not_be_loaded()
                .with_message(format!("can not read mappers directory [{}]: {}", dir, e))
        })?;

        let mut config = Self::empty();
        for entry in entries
            .iter()
            .filter(|entry| !entry.is_dir && entry.name.ends_with(".xml"))
        {
            let file_path = join_path(&dir, &entry.name);
            let bytes = options.fs.read_file(&file_path).map_err(|e| {
                PersistenceError::config_can_not_be_loaded()
                    .with_message(format!("can not read mapper file [{}]: {}", file_path, e))
            })?;
            let mapper = Self::from_xml(&bytes).map_err(|e| {
                PersistenceError::config_can_not_be_loaded().with_message(format!(
                    "mapper file [{}]: {}",
                    file_path,
                    e.message().unwrap_or_default()
                ))
            })?;
            config.add_config(mapper)?;
        }

        tracing::debug!("Loaded {} statements from {}", config.len(), dir);

        Ok(config)
    }

    /// An empty configuration, used as the starting point of an engine.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a single mapper document.
    pub fn from_xml(bytes: &[u8]) -> StorageResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            PersistenceError::config_can_not_be_loaded()
                .with_message(format!("invalid utf-8: {}", e))
        })?;
        let mapper: MapperConfig = quick_xml::de::from_str(text).map_err(|e| {
            PersistenceError::config_can_not_be_loaded()
                .with_message(format!("file can not be parsed as xml: {}", e))
        })?;

        if mapper.id.trim().is_empty() {
            return Err(PersistenceError::config_can_not_be_loaded()
                .with_message("mapper id can not be empty"));
        }

        let mut config = Self::empty();
        for statement in mapper.statements {
            let key = format!("{}.{}", mapper.id, statement.id);
            let statement = StatementConfig {
                content: statement.content.trim().to_string(),
                ..statement
            };
            if config.data_map.insert(key.clone(), statement).is_some() {
                return Err(PersistenceError::config_can_not_be_loaded()
                    .with_message(format!("a statement config already exists with id [{}]", key)));
            }
        }
        Ok(config)
    }

    /// Merge `other` into this configuration.
    ///
    /// Fails without modifying `self` if any id is already present.
    pub fn add_config(&mut self, other: StorageConfig) -> StorageResult<()> {
        if let Some(key) = other
            .data_map
            .keys()
            .find(|key| self.data_map.contains_key(*key))
        {
            return Err(PersistenceError::config_can_not_be_loaded()
                .with_message(format!("a statement config already exists with id [{}]", key)));
        }

        self.data_map.extend(other.data_map);
        Ok(())
    }

    pub fn get_statement(&self, id: &str) -> Option<&StatementConfig> {
        self.data_map.get(id)
    }

    /// Registered statement ids, sorted.
    pub fn statement_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.data_map.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.data_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_map.is_empty()
    }
}

fn join_path(base: &str, child: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", base, child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    const ADMIN_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mapper id="admin">
    <statement id="insert">
        INSERT INTO admins (id, role) VALUES (:id, :role)
    </statement>
    <statement id="list"><![CDATA[
        SELECT id, role FROM admins WHERE limit_value < 10
    ]]></statement>
</mapper>
"#;

    const USER_XML: &str = r#"<mapper id="user">
    <statement id="getById">SELECT id FROM users WHERE id=:id</statement>
</mapper>"#;

    fn fs() -> MemoryFs {
        MemoryFs::new()
            .with_file("include/config/mappers/sqlite/admin.xml", ADMIN_XML)
            .with_file("include/config/mappers/sqlite/user.xml", USER_XML)
            .with_file("include/config/mappers/sqlite/README.md", "not a mapper")
            .with_file("include/config/mappers/sqlite/old/legacy.xml", "<broken")
    }

    #[test]
    fn test_load_from_default_path() {
        let fs = fs();
        let config = StorageConfig::new(StorageConfigOptions {
            fs: &fs,
            mappers_path: None,
            driver: "sqlite",
        })
        .unwrap();

        assert_eq!(config.len(), 3);
        assert_eq!(
            config.statement_ids(),
            vec!["admin.insert", "admin.list", "user.getById"]
        );

        let insert = config.get_statement("admin.insert").unwrap();
        assert_eq!(insert.id, "insert");
        assert_eq!(
            insert.content,
            "INSERT INTO admins (id, role) VALUES (:id, :role)"
        );
        assert!(config
            .get_statement("admin.list")
            .unwrap()
            .content
            .contains("limit_value < 10"));
    }

    #[test]
    fn test_missing_driver_directory() {
        let fs = fs();
        let err = StorageConfig::new(StorageConfigOptions {
            fs: &fs,
            mappers_path: Some("include/config/mappers"),
            driver: "postgres",
        })
        .unwrap_err();
        assert!(err.is_config_can_not_be_loaded());
    }

    #[test]
    fn test_malformed_xml_fails() {
        let fs = MemoryFs::new().with_file("mappers/sqlite/bad.xml", "<mapper id=\"x\"><statement");
        let err = StorageConfig::new(StorageConfigOptions {
            fs: &fs,
            mappers_path: Some("mappers"),
            driver: "sqlite",
        })
        .unwrap_err();
        assert!(err.is_config_can_not_be_loaded());
    }

    #[test]
    fn test_duplicate_across_files_fails() {
        let fs = MemoryFs::new()
            .with_file("mappers/sqlite/a.xml", USER_XML)
            .with_file("mappers/sqlite/b.xml", USER_XML);
        let err = StorageConfig::new(StorageConfigOptions {
            fs: &fs,
            mappers_path: Some("mappers"),
            driver: "sqlite",
        })
        .unwrap_err();
        assert!(err.to_string().contains("user.getById"));
    }

    #[test]
    fn test_add_config_collision_leaves_original_untouched() {
        let mut config = StorageConfig::from_xml(USER_XML.as_bytes()).unwrap();
        let mut other = StorageConfig::from_xml(ADMIN_XML.as_bytes()).unwrap();
        other
            .add_config(StorageConfig::from_xml(USER_XML.as_bytes()).unwrap())
            .unwrap();

        let err = config.add_config(other).unwrap_err();
        assert!(err.is_config_can_not_be_loaded());
        assert_eq!(config.len(), 1);
        assert!(config.get_statement("admin.insert").is_none());
    }

    #[test]
    fn test_add_config_disjoint() {
        let mut config = StorageConfig::empty();
        assert!(config.is_empty());
        config
            .add_config(StorageConfig::from_xml(USER_XML.as_bytes()).unwrap())
            .unwrap();
        config
            .add_config(StorageConfig::from_xml(ADMIN_XML.as_bytes()).unwrap())
            .unwrap();
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn test_mapper_without_id_is_rejected() {
        let err =
            StorageConfig::from_xml(b"<mapper><statement id=\"a\">SELECT 1</statement></mapper>")
                .unwrap_err();
        assert!(err.is_config_can_not_be_loaded());
    }
}
