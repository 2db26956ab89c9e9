//! Host resource collaborators that supply module text.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use fabula_core::PathRules;
use thiserror::Error;

/// Failure to read a module's text.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No module exists at the path.
    #[error("not found")]
    NotFound,

    /// The module exists but could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Supplies module source text by canonical path.
pub trait ScriptSource {
    /// Read the full text of the module at `canonical_path`.
    fn read_text(&self, canonical_path: &str) -> Result<String, SourceError>;
}

/// In-memory modules, keyed by canonical path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module.
    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Add or replace a module.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Whether a module exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether there are no modules.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ScriptSource for MemorySource {
    fn read_text(&self, canonical_path: &str) -> Result<String, SourceError> {
        self.files
            .get(canonical_path)
            .cloned()
            .ok_or(SourceError::NotFound)
    }
}

/// Modules on disk: the script root maps onto a directory.
///
/// With the default rules, `res://chapters/one.lua` reads
/// `<dir>/chapters/one.lua`. Opaque identifiers are never found.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
    rules: PathRules,
}

impl DirSource {
    /// Serve modules from `dir` under the given path rules.
    pub fn new(dir: impl Into<PathBuf>, rules: PathRules) -> Self {
        Self {
            dir: dir.into(),
            rules,
        }
    }

    fn file_path(&self, canonical_path: &str) -> Option<PathBuf> {
        let relative = self.rules.strip_root(canonical_path)?;
        let mut path = self.dir.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            if segment == ".." || segment == "." {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

impl ScriptSource for DirSource {
    fn read_text(&self, canonical_path: &str) -> Result<String, SourceError> {
        let path = self
            .file_path(canonical_path)
            .ok_or(SourceError::NotFound)?;
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound,
            _ => SourceError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_source_lookup() {
        let source = MemorySource::new().with_file("res://intro.lua", "say('hi')");
        assert_eq!(source.len(), 1);
        assert!(source.contains("res://intro.lua"));
        assert_eq!(source.read_text("res://intro.lua").unwrap(), "say('hi')");
        assert!(matches!(
            source.read_text("res://missing.lua"),
            Err(SourceError::NotFound)
        ));
    }

    #[test]
    fn dir_source_maps_root_onto_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("chapters")).unwrap();
        std::fs::write(dir.path().join("chapters/one.lua"), "-- one").unwrap();

        let source = DirSource::new(dir.path(), PathRules::default());
        assert_eq!(source.read_text("res://chapters/one.lua").unwrap(), "-- one");
        assert!(matches!(
            source.read_text("res://chapters/two.lua"),
            Err(SourceError::NotFound)
        ));
    }

    #[test]
    fn dir_source_rejects_paths_outside_root() {
        let dir = TempDir::new().unwrap();
        let source = DirSource::new(dir.path(), PathRules::default());
        assert!(matches!(
            source.read_text("uid://abc"),
            Err(SourceError::NotFound)
        ));
        assert!(matches!(
            source.read_text("res://../etc/passwd"),
            Err(SourceError::NotFound)
        ));
    }
}
