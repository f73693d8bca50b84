//! Path resolution for configuration and data files.
//!
//! All data is stored in `~/.metabolikal/` unless overridden:
//! - `config.yaml` - Main configuration file
//! - `metabolikal.db` - `SQLite` database (ledger, optional queue store)
//! - `store/` - File-backed key-value store

use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// Paths to configuration and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Root directory: `~/.metabolikal/`
    pub root: PathBuf,
    /// Config file: `~/.metabolikal/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.metabolikal/metabolikal.db`
    pub database: PathBuf,
    /// Key-value store directory: `~/.metabolikal/store/`
    pub store: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SyncError> {
        let home = std::env::var("HOME")
            .map_err(|_| SyncError::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_root(PathBuf::from(home).join(".metabolikal")))
    }

    /// Resolve paths from an explicit root, falling back to the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is given and the home directory cannot be
    /// determined.
    pub fn resolve(root: Option<&Path>) -> Result<Self, SyncError> {
        root.map_or_else(Self::new, |r| Ok(Self::with_root(r.to_path_buf())))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("metabolikal.db"),
            store: root.join("store"),
            root,
        }
    }

    /// Ensure all directories exist, creating them if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), SyncError> {
        for dir in [&self.root, &self.store] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    SyncError::Config(format!(
                        "Failed to create directory {}: {e}",
                        dir.display()
                    ))
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_with_root() {
        let root = PathBuf::from("/tmp/test-metabolikal");
        let paths = Paths::with_root(root.clone());

        assert_eq!(paths.root, root);
        assert_eq!(paths.config_file, root.join("config.yaml"));
        assert_eq!(paths.database, root.join("metabolikal.db"));
        assert_eq!(paths.store, root.join("store"));
    }

    #[test]
    fn test_resolve_prefers_explicit_root() {
        let paths = Paths::resolve(Some(Path::new("/data/mk"))).unwrap();
        assert_eq!(paths.root, PathBuf::from("/data/mk"));
    }

    #[test]
    fn test_ensure_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path().join("nested"));

        paths.ensure_dirs().unwrap();

        assert!(paths.root.exists());
        assert!(paths.store.exists());
    }
}
