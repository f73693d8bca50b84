//! JSON output formatting.

use serde::Serialize;
use serde_json::json;

use crate::error::SyncError;
use crate::queue::{QueueOutcome, QueueStats, QueuedAction};
use crate::sync::CompletionRecord;

/// Format pending actions as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_queue_json(actions: &[QueuedAction]) -> Result<String, SyncError> {
    let output = json!({
        "count": actions.len(),
        "items": actions
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format the outcome of queuing an action as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_outcome_json(outcome: &QueueOutcome, pending: usize) -> Result<String, SyncError> {
    let action = match outcome {
        QueueOutcome::Queued(a) | QueueOutcome::Cancelled(a) => Some(a),
        QueueOutcome::AlreadyQueued => None,
    };
    let output = json!({
        "outcome": outcome.label(),
        "action": action,
        "pending": pending
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format queue statistics as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_stats_json(stats: &QueueStats, key: &str) -> Result<String, SyncError> {
    let output = json!({
        "storage_key": key,
        "pending": stats.pending,
        "retrying": stats.retrying,
        "by_plan": {
            "diet": stats.by_plan[0],
            "supplement": stats.by_plan[1],
            "workout": stats.by_plan[2],
            "lifestyle": stats.by_plan[3]
        },
        "oldest_queued_at": stats.oldest_queued_at
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format ledger records as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_ledger_json(records: &[CompletionRecord]) -> Result<String, SyncError> {
    let output = json!({
        "count": records.len(),
        "items": records
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, SyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{CompletionAction, PlanType};
    use chrono::NaiveDate;

    #[test]
    fn test_outcome_json() {
        let action = QueuedAction::new(
            "item-1",
            PlanType::Diet,
            NaiveDate::from_ymd_opt(2026, 1, 27).unwrap(),
            CompletionAction::Complete,
        );
        let json = format_outcome_json(&QueueOutcome::Queued(action), 1).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["outcome"], "queued");
        assert_eq!(value["action"]["sourceId"], "item-1");
        assert_eq!(value["pending"], 1);

        let json = format_outcome_json(&QueueOutcome::AlreadyQueued, 1).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["action"].is_null());
    }

    #[test]
    fn test_stats_json() {
        let stats = QueueStats {
            pending: 2,
            retrying: 1,
            by_plan: [1, 0, 1, 0],
            oldest_queued_at: Some(1_769_500_000_000),
        };
        let json = format_stats_json(&stats, "k").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["pending"], 2);
        assert_eq!(value["by_plan"]["workout"], 1);
        assert_eq!(value["storage_key"], "k");
    }
}
