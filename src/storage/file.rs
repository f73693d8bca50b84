//! File-backed key-value store.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go through a temp file in the
//! same directory and are renamed into place, so a crash never leaves a
//! half-written queue behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::kv::KeyValueStore;
use crate::error::SyncError;

/// Directory of JSON files, one per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or would escape the directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, SyncError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(SyncError::Storage(format!("Invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            SyncError::Storage(format!(
                "Failed to create directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| SyncError::Storage(format!("Failed to create temp file: {e}")))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| SyncError::Storage(format!("Failed to write temp file: {e}")))?;
        tmp.persist(&path).map_err(|e| {
            SyncError::Storage(format!("Failed to replace {}: {}", path.display(), e.error))
        })?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Storage(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(store.get("metabolikal_completion_queue").unwrap().is_none());
    }

    #[test]
    fn test_set_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("store"));

        store.set("queue", "[1,2]").unwrap();

        let path = store.path_for("queue").unwrap();
        assert!(path.exists());
        assert_eq!(store.get("queue").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_overwrite_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("queue", "old").unwrap();
        store.set("queue", "new").unwrap();
        assert_eq!(store.get("queue").unwrap().as_deref(), Some("new"));

        store.remove("queue").unwrap();
        store.remove("queue").unwrap();
        assert!(store.get("queue").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let store = FileStore::new("/tmp/unused");
        assert!(store.path_for("../etc/passwd").is_err());
        assert!(store.path_for("").is_err());
        assert!(store.path_for(".hidden").is_err());
        assert!(store.path_for("queue.unreadable").is_ok());
    }
}
