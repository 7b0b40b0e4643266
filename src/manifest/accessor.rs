//! Structured access to manifests by field query.
//!
//! [`DocumentAccessor`] is the seam between the updater and wherever the
//! manifest lives. [`FileAccessor`] works on disk; [`MemoryAccessor`] keeps
//! documents in memory for callers that never touch the filesystem.

use super::document::ManifestDocument;
use super::query::FieldPath;
use crate::error::{Result, UpdateError};
use crate::fs::Transaction;
use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Full document text before and after a `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub before: String,
    pub after: String,
}

/// Reads and writes single fields of a manifest.
pub trait DocumentAccessor {
    /// Returns the value at `query`.
    fn get(&self, manifest: &Path, query: &FieldPath) -> Result<Value>;

    /// Sets the scalar at `query` to `value`, leaving every other line as is.
    ///
    /// Nothing is persisted unless the edited document reads back `value`.
    fn set(&mut self, manifest: &Path, query: &FieldPath, value: &str) -> Result<Edit>;
}

/// Accessor backed by files on disk.
///
/// Writes go through a [`Transaction`], so a failed write leaves the
/// manifest as it was.
#[derive(Debug, Clone, Default)]
pub struct FileAccessor {
    dry_run: bool,
}

impl FileAccessor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    fn load(manifest: &Path) -> Result<ManifestDocument> {
        let source = fs::read_to_string(manifest).map_err(|source| {
            log::error!("Failed to read {}: {}", manifest.display(), source);
            UpdateError::NotFound {
                path: manifest.to_path_buf(),
                source,
            }
        })?;
        ManifestDocument::parse(source)
    }
}

impl DocumentAccessor for FileAccessor {
    fn get(&self, manifest: &Path, query: &FieldPath) -> Result<Value> {
        Self::load(manifest)?.get(query).cloned()
    }

    fn set(&mut self, manifest: &Path, query: &FieldPath, value: &str) -> Result<Edit> {
        let mut doc = Self::load(manifest)?;
        let before = doc.as_str().to_string();

        if !doc.set(query, value)? {
            return Ok(Edit {
                after: before.clone(),
                before,
            });
        }
        let after = doc.into_string();

        let mut txn = Transaction::new(self.dry_run);
        txn.update_file(manifest.to_path_buf(), after.clone())?;
        if let Err(e) = txn.commit() {
            log::error!("Failed to write {}: {}", manifest.display(), e);
            return Err(e);
        }

        let stats = txn.stats();
        log::debug!(
            "{} {} file(s), {} bytes",
            if txn.is_dry_run() { "Would write" } else { "Wrote" },
            stats.files_updated,
            stats.bytes_written
        );

        Ok(Edit { before, after })
    }
}

/// Accessor over documents held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessor {
    documents: HashMap<PathBuf, String>,
}

impl MemoryAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the document stored under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.documents.insert(path.into(), source.into());
    }

    pub fn document(&self, path: &Path) -> Option<&str> {
        self.documents.get(path).map(String::as_str)
    }

    fn load(&self, manifest: &Path) -> Result<ManifestDocument> {
        let source = self.documents.get(manifest).ok_or_else(|| UpdateError::NotFound {
            path: manifest.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
        })?;
        ManifestDocument::parse(source.as_str())
    }
}

impl DocumentAccessor for MemoryAccessor {
    fn get(&self, manifest: &Path, query: &FieldPath) -> Result<Value> {
        self.load(manifest)?.get(query).cloned()
    }

    fn set(&mut self, manifest: &Path, query: &FieldPath, value: &str) -> Result<Edit> {
        let mut doc = self.load(manifest)?;
        let before = doc.as_str().to_string();
        doc.set(query, value)?;
        let after = doc.into_string();

        self.documents.insert(manifest.to_path_buf(), after.clone());
        Ok(Edit { before, after })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = "stemcells:\n- alias: default\n  os: ubuntu-xenial\n  version: old\n";

    #[test]
    fn test_file_accessor_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cfcr.yml");
        fs::write(&path, MANIFEST).unwrap();

        let mut accessor = FileAccessor::new(false);
        let query = FieldPath::stemcell_version();
        let edit = accessor.set(&path, &query, "new").unwrap();

        assert_ne!(edit.before, edit.after);
        assert_eq!(fs::read_to_string(&path).unwrap(), edit.after);
        assert_eq!(accessor.get(&path, &query).unwrap(), Value::from("new"));
    }

    #[test]
    fn test_file_accessor_dry_run_does_not_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cfcr.yml");
        fs::write(&path, MANIFEST).unwrap();

        let mut accessor = FileAccessor::new(true);
        let edit = accessor
            .set(&path, &FieldPath::stemcell_version(), "new")
            .unwrap();

        assert!(edit.after.contains("version: new"));
        assert_eq!(fs::read_to_string(&path).unwrap(), MANIFEST);
    }

    #[test]
    fn test_file_accessor_missing_file() {
        let temp = TempDir::new().unwrap();
        let accessor = FileAccessor::new(false);
        let result = accessor.get(&temp.path().join("missing.yml"), &FieldPath::stemcell_version());
        assert!(matches!(result, Err(UpdateError::NotFound { .. })));
    }

    #[test]
    fn test_file_accessor_schema_error_leaves_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cfcr.yml");
        fs::write(&path, "stemcells: []\n").unwrap();

        let mut accessor = FileAccessor::new(false);
        let result = accessor.set(&path, &FieldPath::stemcell_version(), "new");

        assert!(matches!(result, Err(UpdateError::Schema { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "stemcells: []\n");
    }

    #[test]
    fn test_memory_accessor() {
        let mut accessor = MemoryAccessor::new();
        accessor.insert("cfcr.yml", MANIFEST);

        let path = Path::new("cfcr.yml");
        accessor
            .set(path, &FieldPath::stemcell_version(), "new")
            .unwrap();

        assert_eq!(
            accessor.document(path).unwrap(),
            MANIFEST.replace("version: old", "version: new")
        );
        assert!(matches!(
            accessor.get(Path::new("other.yml"), &FieldPath::stemcell_version()),
            Err(UpdateError::NotFound { .. })
        ));
    }
}
