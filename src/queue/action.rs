//! Queued completion actions.
//!
//! Defines the plan categories, the two toggle directions, and the record
//! that sits in the queue until the backend confirms it.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;

/// Category of trackable daily item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// Meal or diet plan entry
    Diet,
    /// Supplement intake
    Supplement,
    /// Workout session or exercise
    Workout,
    /// Lifestyle activity (sleep, steps, hydration)
    Lifestyle,
}

impl PlanType {
    /// All plan types, in display order.
    pub const ALL: [Self; 4] = [Self::Diet, Self::Supplement, Self::Workout, Self::Lifestyle];

    /// Wire name of this plan type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Diet => "diet",
            Self::Supplement => "supplement",
            Self::Workout => "workout",
            Self::Lifestyle => "lifestyle",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diet" => Ok(Self::Diet),
            "supplement" | "supplements" => Ok(Self::Supplement),
            "workout" | "workouts" => Ok(Self::Workout),
            "lifestyle" => Ok(Self::Lifestyle),
            other => Err(SyncError::Parse(format!("Unknown plan type: {other}"))),
        }
    }
}

/// Direction of a completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionAction {
    /// Mark the item done for the day
    Complete,
    /// Undo a previous completion
    Uncomplete,
}

impl CompletionAction {
    /// The action that cancels this one out.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Complete => Self::Uncomplete,
            Self::Uncomplete => Self::Complete,
        }
    }

    /// Wire name of this action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Uncomplete => "uncomplete",
        }
    }
}

impl fmt::Display for CompletionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionAction {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "complete" | "done" => Ok(Self::Complete),
            "uncomplete" | "undo" => Ok(Self::Uncomplete),
            other => Err(SyncError::Parse(format!("Unknown action: {other}"))),
        }
    }
}

/// A completion toggle waiting to be confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    /// Unique ID, assigned at enqueue time
    pub id: String,
    /// ID of the diet entry, supplement, workout or lifestyle activity
    pub source_id: String,
    /// Which plan the item belongs to
    pub plan_type: PlanType,
    /// Calendar day the toggle applies to
    pub completed_date: NaiveDate,
    /// Complete or uncomplete
    pub action: CompletionAction,
    /// Milliseconds since the Unix epoch when queued
    pub queued_at: i64,
    /// Failed sync attempts so far
    #[serde(default)]
    pub attempts: u32,
    /// Error from the most recent failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedAction {
    /// Create a fresh action stamped with the current time.
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        plan_type: PlanType,
        completed_date: NaiveDate,
        action: CompletionAction,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            plan_type,
            completed_date,
            action,
            queued_at: Utc::now().timestamp_millis(),
            attempts: 0,
            last_error: None,
        }
    }

    /// Whether this action targets the given `(source_id, completed_date)` pair.
    #[must_use]
    pub fn matches(&self, source_id: &str, completed_date: NaiveDate) -> bool {
        self.source_id == source_id && self.completed_date == completed_date
    }

    /// Whether another sync attempt is allowed.
    #[must_use]
    pub const fn should_retry(&self, max_attempts: u32) -> bool {
        self.attempts < max_attempts
    }

    /// Age of the action relative to `now_ms`, in whole seconds.
    #[must_use]
    pub const fn age_seconds(&self, now_ms: i64) -> i64 {
        (now_ms - self.queued_at) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_opposite() {
        assert_eq!(CompletionAction::Complete.opposite(), CompletionAction::Uncomplete);
        assert_eq!(CompletionAction::Uncomplete.opposite(), CompletionAction::Complete);
    }

    #[test]
    fn test_plan_type_from_str() {
        assert_eq!("Diet".parse::<PlanType>().unwrap(), PlanType::Diet);
        assert_eq!("workouts".parse::<PlanType>().unwrap(), PlanType::Workout);
        assert!("cardio".parse::<PlanType>().is_err());
    }

    #[test]
    fn test_new_action_defaults() {
        let action = QueuedAction::new(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        assert_eq!(action.attempts, 0);
        assert!(action.last_error.is_none());
        assert!(action.queued_at > 0);
        assert!(action.matches("item-1", date("2026-01-27")));
        assert!(!action.matches("item-1", date("2026-01-28")));
    }

    #[test]
    fn test_serializes_camel_case() {
        let action = QueuedAction::new(
            "sup-9",
            PlanType::Supplement,
            date("2026-02-01"),
            CompletionAction::Uncomplete,
        );
        let json = serde_json::to_string(&action).expect("should serialize");
        assert!(json.contains("\"sourceId\":\"sup-9\""));
        assert!(json.contains("\"planType\":\"supplement\""));
        assert!(json.contains("\"completedDate\":\"2026-02-01\""));
        assert!(json.contains("\"action\":\"uncomplete\""));
        assert!(json.contains("\"queuedAt\":"));
        assert!(!json.contains("lastError"));
    }

    #[test]
    fn test_deserializes_without_attempts() {
        let json = r#"{
            "id": "6f1c1c3e-5d2a-4a39-9a57-1d1f0d6b4a10",
            "sourceId": "w-3",
            "planType": "workout",
            "completedDate": "2026-01-27",
            "action": "complete",
            "queuedAt": 1769500000000
        }"#;
        let action: QueuedAction = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(action.plan_type, PlanType::Workout);
        assert_eq!(action.attempts, 0);
    }

    #[test]
    fn test_should_retry() {
        let mut action = QueuedAction::new(
            "x",
            PlanType::Lifestyle,
            date("2026-01-01"),
            CompletionAction::Complete,
        );
        assert!(action.should_retry(3));
        action.attempts = 3;
        assert!(!action.should_retry(3));
    }
}
