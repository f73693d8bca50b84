//! Error types for metabolikal-sync.

use thiserror::Error;

/// Errors raised by the completion queue, its storage and the sync driver.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid configuration or command-line input.
    #[error("Configuration error: {0}")]
    Config(String),

    /// SQLite failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Key-value store failure (read, write or remove).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed JSON, YAML or date input.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend could not be reached.
    #[error("Network unavailable: {0}")]
    Offline(String),

    /// The backend refused the action.
    #[error("Sync rejected: {0}")]
    Rejected(String),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl SyncError {
    /// Whether the error means the backend was unreachable, as opposed to a
    /// failure of this particular action.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_maps_to_parse() {
        let err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err: SyncError = err.into();
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn test_is_offline() {
        assert!(SyncError::Offline("no route".to_string()).is_offline());
        assert!(!SyncError::Rejected("conflict".to_string()).is_offline());
    }
}
