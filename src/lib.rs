//! metabolikal-sync - offline completion queue for daily plan tracking
//!
//! This crate buffers completion toggles for diet, supplement, workout and
//! lifestyle items while the backend is unreachable, merges toggles that
//! cancel each other out, persists the queue across restarts, and drains it
//! once connectivity returns.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod offline;
pub mod output;
pub mod queue;
pub mod storage;
pub mod sync;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::SyncError;
pub use network::{NetworkMonitor, NetworkStatus, Subscription};
pub use offline::OfflineCompletions;
pub use queue::{CompletionAction, CompletionQueue, PlanType, QueueOutcome, QueuedAction};
pub use storage::{Database, FileStore, KeyValueStore, MemoryStore};
pub use sync::{CompletionLedger, CompletionSink, DriverConfig, SyncDriver, SyncResult};
