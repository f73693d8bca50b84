//! Output formatting for metabolikal-sync.
//!
//! This module renders queue, sync and ledger data as colored text or JSON.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::SyncError;
use crate::queue::{CompletionAction, QueueOutcome, QueueStats, QueuedAction};
use crate::sync::{format_sync_result, CompletionRecord, SyncResult};

pub use json::*;
pub use pretty::*;

/// Format pending actions based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_queue(actions: &[QueuedAction], format: OutputFormat) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_queue_pretty(actions)),
        OutputFormat::Json => format_queue_json(actions),
    }
}

/// Format a queue outcome based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_outcome(
    outcome: &QueueOutcome,
    pending: usize,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_outcome_pretty(outcome, pending)),
        OutputFormat::Json => format_outcome_json(outcome, pending),
    }
}

/// Format the pending state of one item based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_pending(
    source_id: &str,
    pending: Option<CompletionAction>,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_pending_pretty(source_id, pending)),
        OutputFormat::Json => to_json(&serde_json::json!({
            "source_id": source_id,
            "pending": pending
        })),
    }
}

/// Format queue statistics based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_stats(
    stats: &QueueStats,
    key: &str,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_stats_pretty(stats, key)),
        OutputFormat::Json => format_stats_json(stats, key),
    }
}

/// Format a sync run based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_sync(result: &SyncResult, format: OutputFormat) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_sync_result(result)),
        OutputFormat::Json => to_json(result),
    }
}

/// Format ledger records based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_ledger(
    records: &[CompletionRecord],
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_ledger_pretty(records)),
        OutputFormat::Json => format_ledger_json(records),
    }
}
