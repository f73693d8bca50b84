use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::queue::{CompletionAction, PlanType, QueueOutcome, QueueStats, QueuedAction};
use crate::sync::CompletionRecord;

fn action_icon(action: CompletionAction) -> ColoredString {
    match action {
        CompletionAction::Complete => "[x]".green(),
        CompletionAction::Uncomplete => "[ ]".white(),
    }
}

fn describe_age(queued_at: i64, now: DateTime<Utc>) -> String {
    let Some(queued) = DateTime::<Utc>::from_timestamp_millis(queued_at) else {
        return "unknown".to_string();
    };
    let age = now.signed_duration_since(queued);
    if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Format pending actions as a table
pub fn format_queue_pretty(actions: &[QueuedAction]) -> String {
    if actions.is_empty() {
        return "Pending completions (0 items)\n  Nothing waiting to sync".to_string();
    }

    let mut output = format!("Pending completions ({} items)\n", actions.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    let now = Utc::now();
    for action in actions {
        let mut line = format!(
            "{} {:<24} {:<11} {}",
            action_icon(action.action),
            action.source_id.bold(),
            action.plan_type.to_string().cyan(),
            action.completed_date.to_string().yellow()
        );
        line.push_str(&format!("  {}", describe_age(action.queued_at, now).dimmed()));

        if action.attempts > 0 {
            line.push_str(&format!(
                "  {}",
                format!("{} failed attempts", action.attempts).red()
            ));
        }

        output.push_str(&line);
        output.push('\n');

        if let Some(error) = &action.last_error {
            let short_error = if error.chars().count() > 50 {
                format!("{}...", error.chars().take(47).collect::<String>())
            } else {
                error.clone()
            };
            output.push_str(&format!("      {}\n", short_error.red()));
        }
    }

    output
}

/// Format the outcome of queuing an action
pub fn format_outcome_pretty(outcome: &QueueOutcome, pending: usize) -> String {
    let line = match outcome {
        QueueOutcome::Queued(a) => format!(
            "{} Queued {} of {} ({}) for {}",
            "✓".green(),
            a.action,
            a.source_id.bold(),
            a.plan_type,
            a.completed_date
        ),
        QueueOutcome::AlreadyQueued => {
            format!("{} Already queued, nothing changed", "○".yellow())
        }
        QueueOutcome::Cancelled(a) => format!(
            "{} Cancelled pending {} of {} for {}",
            "↺".cyan(),
            a.action,
            a.source_id.bold(),
            a.completed_date
        ),
    };
    format!("{line}\n  {} pending", pending)
}

/// Format the pending state of one item
pub fn format_pending_pretty(source_id: &str, pending: Option<CompletionAction>) -> String {
    match pending {
        Some(action) => format!("{} {}: {} pending", action_icon(action), source_id.bold(), action),
        None => format!("{}: {}", source_id.bold(), "nothing pending".dimmed()),
    }
}

/// Format queue statistics
pub fn format_stats_pretty(stats: &QueueStats, key: &str) -> String {
    let mut lines = Vec::new();

    lines.push("Completion Queue Status".bold().to_string());
    lines.push("─".repeat(40));
    lines.push(format!("  Storage key: {}", key.dimmed()));
    lines.push(format!(
        "  Pending:     {} {}",
        stats.pending,
        if stats.pending > 0 {
            "actions waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));
    lines.push(format!(
        "  Retrying:    {} {}",
        stats.retrying,
        if stats.retrying > 0 {
            "actions have failed before".red()
        } else {
            "".normal()
        }
    ));

    for (plan, count) in PlanType::ALL.iter().zip(stats.by_plan) {
        if count > 0 {
            lines.push(format!("    {:<11} {}", plan.to_string(), count));
        }
    }

    if let Some(oldest) = stats.oldest_queued_at {
        lines.push(format!(
            "  Oldest:      {}",
            describe_age(oldest, Utc::now()).dimmed()
        ));
    }

    if stats.pending > 0 {
        lines.push(String::new());
        lines.push(
            "Run 'metabolikal-sync sync run' to push pending actions"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format ledger records as a table
pub fn format_ledger_pretty(records: &[CompletionRecord]) -> String {
    if records.is_empty() {
        return "Completions (0 items)\n  No completions recorded".to_string();
    }

    let mut output = format!("Completions ({} items)\n", records.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for record in records {
        output.push_str(&format!(
            "{} {:<24} {:<11} {}\n",
            "[x]".green(),
            record.source_id.bold(),
            record.plan_type.to_string().cyan(),
            record.completed_date.to_string().yellow()
        ));
    }

    output
}
