//! Queue command implementations.

use chrono::NaiveDate;
use colored::Colorize;

use super::Context;
use crate::cli::args::{OutputFormat, QueueCommands, ToggleArgs};
use crate::core::{cycle_day, date_for_plan_day, parse_completed_date, plan_day_number, today};
use crate::error::SyncError;
use crate::output::{format_outcome, format_pending, format_queue, format_stats, to_json};
use crate::queue::{CompletionAction, PlanType};

fn parse_date(input: Option<&str>) -> Result<Option<NaiveDate>, SyncError> {
    input
        .map(|d| parse_completed_date(d, today()))
        .transpose()
}

/// Execute queue subcommands.
///
/// # Errors
///
/// Returns an error if the plan type or date is invalid, the queue cannot
/// be opened, or output formatting fails.
pub fn queue(ctx: &Context, cmd: QueueCommands) -> Result<String, SyncError> {
    let (args, action) = match cmd {
        QueueCommands::Complete(args) => (args, CompletionAction::Complete),
        QueueCommands::Uncomplete(args) => (args, CompletionAction::Uncomplete),
    };
    toggle(ctx, &args, action)
}

fn toggle(ctx: &Context, args: &ToggleArgs, action: CompletionAction) -> Result<String, SyncError> {
    let plan_type: PlanType = args.plan.parse()?;
    let completed_date = parse_completed_date(&args.date, today())?;

    let mut queue = ctx.open_queue()?;
    let outcome = queue.queue_completion(&args.source_id, plan_type, completed_date, action);

    if queue.persist_failed() {
        return Err(SyncError::Storage(format!(
            "queued in memory but could not save queue '{}'",
            queue.key()
        )));
    }

    format_outcome(&outcome, queue.len(), ctx.format)
}

/// Show the pending action for one item.
///
/// # Errors
///
/// Returns an error if the date is invalid, the queue cannot be opened, or
/// output formatting fails.
pub fn pending(ctx: &Context, source_id: &str, date: Option<&str>) -> Result<String, SyncError> {
    let queue = ctx.open_queue()?;
    let pending = match parse_date(date)? {
        Some(on) => queue.pending_action_on(source_id, on),
        None => queue.pending_action(source_id),
    };
    format_pending(source_id, pending, ctx.format)
}

/// List pending actions.
///
/// # Errors
///
/// Returns an error if the queue cannot be opened or output formatting fails.
pub fn list(ctx: &Context) -> Result<String, SyncError> {
    let queue = ctx.open_queue()?;
    format_queue(queue.actions(), ctx.format)
}

/// Show queue statistics.
///
/// # Errors
///
/// Returns an error if the queue cannot be opened or output formatting fails.
pub fn status(ctx: &Context) -> Result<String, SyncError> {
    let queue = ctx.open_queue()?;
    format_stats(&queue.stats(), queue.key(), ctx.format)
}

/// Drop every pending action.
///
/// # Errors
///
/// Returns an error if `force` is not set while actions are pending, or
/// if the queue cannot be opened.
pub fn clear(ctx: &Context, force: bool) -> Result<String, SyncError> {
    let mut queue = ctx.open_queue()?;
    let count = queue.len();

    if count > 0 && !force {
        return Err(SyncError::Config(format!(
            "{count} actions have not been synced. Use --force to drop them"
        )));
    }
    queue.clear();

    match ctx.format {
        OutputFormat::Json => to_json(&serde_json::json!({ "cleared": count })),
        OutputFormat::Pretty => Ok(format!("Cleared {count} pending actions")),
    }
}

/// Compute the plan day for a date.
///
/// # Errors
///
/// Returns an error if a date is invalid, the cycle length is zero, or
/// output formatting fails.
pub fn plan_day(
    ctx: &Context,
    start: &str,
    date: Option<&str>,
    cycle: Option<u32>,
) -> Result<String, SyncError> {
    let today = today();
    let start = parse_completed_date(start, today)?;
    let date = parse_date(date)?.unwrap_or(today);

    if cycle == Some(0) {
        return Err(SyncError::Config(
            "cycle length must be at least 1 day".to_string(),
        ));
    }

    let day_number = plan_day_number(start, date);
    let position = day_number.zip(cycle).map(|(day, len)| cycle_day(day, len));
    let next_cycle_start = day_number.zip(cycle).and_then(|(day, len)| {
        let first_of_next = day.checked_add(len - cycle_day(day, len))?.checked_add(1)?;
        date_for_plan_day(start, first_of_next)
    });

    match ctx.format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "start": start,
            "date": date,
            "day": day_number,
            "cycle_length": cycle,
            "cycle_day": position,
            "next_cycle_start": next_cycle_start,
        })),
        OutputFormat::Pretty => {
            let Some(day) = day_number else {
                return Ok(format!(
                    "{} is before the plan starts on {}",
                    date.to_string().yellow(),
                    start.to_string().yellow()
                ));
            };

            let mut output = format!(
                "{}: day {}",
                date.to_string().yellow(),
                day.to_string().bold()
            );
            if let (Some(cd), Some(len)) = (position, cycle) {
                output.push_str(&format!("\n  Cycle day: {cd} of {len}"));
            }
            if let Some(next) = next_cycle_start {
                output.push_str(&format!("\n  {}", format!("Next cycle starts {next}").dimmed()));
            }
            Ok(output)
        }
    }
}
