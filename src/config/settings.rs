//! Configuration settings.
//!
//! Settings are loaded from `config.yaml` under the data root. Every
//! section is optional; missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::error::SyncError;
use crate::queue::DEFAULT_STORAGE_KEY;
use crate::sync::DriverConfig;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Queue storage settings.
    pub queue: QueueConfig,
    /// Sync settings.
    pub sync: SyncConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    pub default_output: OutputFormat,
}

/// Where the queue blob is kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per key under `store/`.
    #[default]
    File,
    /// The `kv_store` table of the database.
    Sqlite,
}

/// Queue storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueConfig {
    /// Key the queue blob is stored under.
    pub storage_key: String,
    /// Storage backend.
    pub backend: StoreBackend,
}

/// Sync settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Failed attempts after which an action is skipped.
    pub max_attempts: u32,
    /// Stop a run at the first failure.
    pub stop_on_error: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `METABOLIKAL_LOG` is unset.
    pub level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Pretty,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backend: StoreBackend::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let driver = DriverConfig::default();
        Self {
            max_attempts: driver.max_attempts,
            stop_on_error: driver.stop_on_error,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl SyncConfig {
    /// Driver configuration for a run.
    #[must_use]
    pub const fn driver_config(&self, dry_run: bool) -> DriverConfig {
        DriverConfig {
            max_attempts: self.max_attempts,
            stop_on_error: self.stop_on_error,
            dry_run,
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            SyncError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), SyncError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| SyncError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            SyncError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.queue.storage_key.trim().is_empty() {
            return Err(SyncError::Config(
                "queue.storage_key must not be empty".to_string(),
            ));
        }
        if self.sync.max_attempts == 0 {
            return Err(SyncError::Config(
                "sync.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
