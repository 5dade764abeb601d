//! Read-only file system abstraction used to load mapper files and migration
//! scripts.
//!
//! Three backends are provided: a directory on disk, an in-memory map (tests),
//! and any `rust-embed` folder compiled into the binary.

use std::collections::BTreeMap;
use std::io;
use std::marker::PhantomData;
use std::path::PathBuf;

use rust_embed::RustEmbed;

/// An entry returned by [`ReadDirAndFileFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// A file system able to list a directory and read a file, both addressed by
/// `/`-separated relative paths.
pub trait ReadDirAndFileFs: Send + Sync {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches("./").trim_matches('/')
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path))
}

/// File system rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ReadDirAndFileFs for DirFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.root.join(normalize(path)))? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(normalize(path)))
    }
}

/// In-memory file system keyed by full relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .insert(normalize(path).to_string(), content.into());
    }
}

impl ReadDirAndFileFs for MemoryFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        list_children(path, self.files.keys().map(String::as_str))
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(normalize(path))
            .cloned()
            .ok_or_else(|| not_found(path))
    }
}

/// File system backed by a `rust-embed` folder.
pub struct EmbeddedFs<E> {
    _assets: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedFs<E> {
    pub fn new() -> Self {
        Self {
            _assets: PhantomData,
        }
    }
}

impl<E: RustEmbed> Default for EmbeddedFs<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RustEmbed> ReadDirAndFileFs for EmbeddedFs<E> {
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let names: Vec<String> = E::iter().map(|name| name.into_owned()).collect();
        list_children(path, names.iter().map(String::as_str))
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        E::get(normalize(path))
            .map(|file| file.data.into_owned())
            .ok_or_else(|| not_found(path))
    }
}

/// Derive the direct children of `dir` from a flat list of file paths.
fn list_children<'a>(
    dir: &str,
    paths: impl Iterator<Item = &'a str>,
) -> io::Result<Vec<DirEntry>> {
    let dir = normalize(dir);
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    };

    let mut children: BTreeMap<String, bool> = BTreeMap::new();
    for path in paths {
        let Some(rest) = path.strip_prefix(prefix.as_str()) else {
            continue;
        };
        match rest.split_once('/') {
            Some((child, _)) => {
                children.insert(child.to_string(), true);
            }
            None => {
                children.entry(rest.to_string()).or_insert(false);
            }
        }
    }

    if children.is_empty() {
        return Err(not_found(dir));
    }

    Ok(children
        .into_iter()
        .map(|(name, is_dir)| DirEntry { name, is_dir })
        .collect())
}
