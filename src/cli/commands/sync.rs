//! Sync command implementation.
//!
//! Drains the completion queue into the local ledger.

use colored::Colorize;

use super::Context;
use crate::cli::args::{OutputFormat, SyncCommands};
use crate::core::{parse_completed_date, today};
use crate::error::SyncError;
use crate::network::{NetworkMonitor, NetworkStatus};
use crate::offline::OfflineCompletions;
use crate::output::{format_ledger, format_sync, to_json};

/// Execute sync subcommands.
///
/// # Errors
///
/// Returns an error if the queue or ledger cannot be opened, or output
/// formatting fails. Per-action failures are reported in the output.
pub fn sync(ctx: &Context, cmd: SyncCommands) -> Result<String, SyncError> {
    match cmd {
        SyncCommands::Run {
            dry_run,
            stop_on_error,
            offline,
        } => run_sync(ctx, dry_run, stop_on_error, offline),
        SyncCommands::Retry => retry(ctx),
    }
}

fn run_sync(
    ctx: &Context,
    dry_run: bool,
    stop_on_error: bool,
    offline: bool,
) -> Result<String, SyncError> {
    let queue = ctx.open_queue()?;
    let ledger = ctx.open_ledger()?;

    let mut config = ctx.config.sync.driver_config(dry_run);
    config.stop_on_error |= stop_on_error;

    let monitor = NetworkMonitor::new(NetworkStatus::from_online(!offline));
    let _status_log = monitor.subscribe(|status| {
        tracing::info!(%status, "connectivity changed");
    });

    let mut service = OfflineCompletions::new(queue, monitor, Box::new(ledger), config);
    let result = service.sync_now();
    let remaining = service.queue().len();

    if !service.is_online() && ctx.format == OutputFormat::Pretty {
        return Ok(format!(
            "{} Offline: {} actions left queued",
            "○".yellow(),
            remaining
        ));
    }

    let mut output = format_sync(&result, ctx.format)?;
    if ctx.format == OutputFormat::Pretty && remaining > 0 && !dry_run {
        output.push_str(&format!("\n{}", format!("{remaining} actions still pending").dimmed()));
    }
    Ok(output)
}

fn retry(ctx: &Context) -> Result<String, SyncError> {
    let mut queue = ctx.open_queue()?;
    let reset = queue.reset_attempts();

    match ctx.format {
        OutputFormat::Json => to_json(&serde_json::json!({ "reset": reset })),
        OutputFormat::Pretty => Ok(format!(
            "Reset {reset} actions for retry. Run 'metabolikal-sync sync run' to push them"
        )),
    }
}

/// Show confirmed completions.
///
/// # Errors
///
/// Returns an error if the date is invalid, the ledger cannot be read, or
/// output formatting fails.
pub fn ledger(ctx: &Context, date: Option<&str>) -> Result<String, SyncError> {
    let on = date.map(|d| parse_completed_date(d, today())).transpose()?;
    let records = ctx.open_ledger()?.list(on)?;
    format_ledger(&records, ctx.format)
}
