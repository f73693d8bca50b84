//! Sync driver for draining the completion queue.
//!
//! Pushes queued actions to a [`CompletionSink`] in queue order. Confirmed
//! actions leave the queue; failed ones stay with their attempt counter
//! bumped so a later run can retry them.

use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;

use crate::error::SyncError;
use crate::queue::{CompletionAction, CompletionQueue, PlanType, QueuedAction};

/// Backend that accepts completion actions.
#[cfg_attr(test, mockall::automock)]
pub trait CompletionSink {
    /// Apply one action on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Offline`] when the backend is unreachable, or
    /// any other error when this action was refused or failed.
    fn push(&self, action: &QueuedAction) -> Result<(), SyncError>;
}

/// Configuration for the sync driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Actions with this many failed attempts are skipped
    pub max_attempts: u32,
    /// Whether to stop on first error
    pub stop_on_error: bool,
    /// Report what would be pushed without pushing
    pub dry_run: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            stop_on_error: false,
            dry_run: false,
        }
    }
}

/// Result of pushing a single action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Queue ID of the action
    pub id: String,
    /// Item the action applies to
    pub source_id: String,
    /// Plan the item belongs to
    pub plan_type: PlanType,
    /// Day the action applies to
    pub completed_date: NaiveDate,
    /// Complete or uncomplete
    pub action: CompletionAction,
    /// Whether the backend confirmed it
    pub success: bool,
    /// Whether it was left untouched
    pub skipped: bool,
    /// Error message if failed or skipped
    pub error: Option<String>,
    /// Attempt count after this run
    pub attempts: u32,
}

impl ExecutionResult {
    fn new(action: &QueuedAction) -> Self {
        Self {
            id: action.id.clone(),
            source_id: action.source_id.clone(),
            plan_type: action.plan_type,
            completed_date: action.completed_date,
            action: action.action,
            success: false,
            skipped: false,
            error: None,
            attempts: action.attempts,
        }
    }
}

/// Result of one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Actions confirmed and removed from the queue
    pub succeeded: usize,
    /// Actions that failed and stay queued
    pub failed: usize,
    /// Actions not attempted
    pub skipped: usize,
    /// Whether the run stopped because the backend went unreachable
    pub interrupted: bool,
    /// Individual results
    pub results: Vec<ExecutionResult>,
}

impl SyncResult {
    /// Create an empty result.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a result.
    pub fn add(&mut self, result: ExecutionResult) {
        if result.skipped {
            self.skipped += 1;
        } else if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Whether nothing failed and the run was not interrupted.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }

    /// Total actions processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// Driver that flushes a [`CompletionQueue`] into a [`CompletionSink`].
pub struct SyncDriver<'a> {
    sink: &'a dyn CompletionSink,
    config: DriverConfig,
}

impl<'a> SyncDriver<'a> {
    /// Create a driver with default config.
    #[must_use]
    pub fn new(sink: &'a dyn CompletionSink) -> Self {
        Self {
            sink,
            config: DriverConfig::default(),
        }
    }

    /// Create a driver with custom config.
    #[must_use]
    pub const fn with_config(sink: &'a dyn CompletionSink, config: DriverConfig) -> Self {
        Self { sink, config }
    }

    /// Push every pending action once.
    pub fn flush(&self, queue: &mut CompletionQueue) -> SyncResult {
        let snapshot = queue.actions().to_vec();
        let mut result = SyncResult::empty();

        tracing::info!(pending = snapshot.len(), dry_run = self.config.dry_run, "sync started");

        for action in &snapshot {
            let mut outcome = ExecutionResult::new(action);

            if !action.should_retry(self.config.max_attempts) {
                outcome.skipped = true;
                outcome.error = Some("Max attempts exceeded".to_string());
                result.add(outcome);
                continue;
            }

            if self.config.dry_run {
                outcome.success = true;
                outcome.skipped = true;
                result.add(outcome);
                continue;
            }

            match self.sink.push(action) {
                Ok(()) => {
                    queue.remove(&action.id);
                    outcome.success = true;
                    result.add(outcome);
                }
                Err(e) if e.is_offline() => {
                    tracing::warn!(error = %e, "backend unreachable, sync interrupted");
                    result.interrupted = true;
                    break;
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(
                        id = %action.id,
                        error = %message,
                        "sync of queued action failed"
                    );
                    outcome.attempts = queue
                        .record_failure(&action.id, &message)
                        .unwrap_or(action.attempts);
                    outcome.error = Some(message);
                    result.add(outcome);

                    if self.config.stop_on_error {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped,
            remaining = queue.len(),
            "sync finished"
        );

        result
    }
}

/// Format sync result for display.
#[must_use]
pub fn format_sync_result(result: &SyncResult) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Sync completed: {} actions", result.total()));
    lines.push("─".repeat(40));

    if result.succeeded > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} synced", result.succeeded).green()
        ));
    }

    if result.failed > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} failed", result.failed).red()
        ));
    }

    if result.skipped > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} skipped", result.skipped).yellow()
        ));
    }

    if result.interrupted {
        lines.push(format!(
            "  {} {}",
            "!".yellow(),
            "backend unreachable, remaining actions left queued".yellow()
        ));
    }

    let errors: Vec<_> = result
        .results
        .iter()
        .filter(|r| r.error.is_some() && !r.success)
        .take(3)
        .collect();

    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for err in errors {
            lines.push(format!(
                "  - {} {} ({}): {}",
                err.action,
                err.source_id,
                err.completed_date,
                err.error.as_deref().unwrap_or("Unknown error")
            ));
        }
    }

    lines.join("\n")
}
