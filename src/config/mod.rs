//! Configuration management.
//!
//! Handles loading configuration and resolving data paths under the data
//! root (`~/.metabolikal/` by default).

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{Config, GeneralConfig, LoggingConfig, QueueConfig, StoreBackend, SyncConfig};
