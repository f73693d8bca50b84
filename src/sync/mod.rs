//! Sync of queued completions to the backend.
//!
//! Features:
//! - Push queued actions in order through a pluggable [`CompletionSink`]
//! - Remove confirmed actions, count failed attempts on the rest
//! - Stop cleanly when the backend becomes unreachable mid-run
//! - A local `SQLite` ledger sink for the command-line front end

pub mod driver;
pub mod ledger;

pub use driver::{
    format_sync_result, CompletionSink, DriverConfig, ExecutionResult, SyncDriver, SyncResult,
};
pub use ledger::{CompletionLedger, CompletionRecord};

#[cfg(test)]
pub use driver::MockCompletionSink;
