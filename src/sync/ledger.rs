//! Local completion ledger.
//!
//! Records confirmed completions in the `completions` table, one row per
//! `(source_id, completed_date)`. It is the sink the CLI syncs into.

use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use super::driver::CompletionSink;
use crate::error::SyncError;
use crate::queue::{CompletionAction, PlanType, QueuedAction};
use crate::storage::Database;

/// A confirmed completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRecord {
    /// Completed item
    pub source_id: String,
    /// Plan the item belongs to
    pub plan_type: PlanType,
    /// Day it was completed for
    pub completed_date: NaiveDate,
    /// When the completion was recorded
    pub completed_at: DateTime<Utc>,
}

/// Ledger of confirmed completions.
pub struct CompletionLedger {
    db: Rc<Database>,
}

impl CompletionLedger {
    /// Create a ledger over an open database.
    #[must_use]
    pub const fn new(db: Rc<Database>) -> Self {
        Self { db }
    }

    /// Record `source_id` as completed on `completed_date`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn mark_completed(
        &self,
        source_id: &str,
        plan_type: PlanType,
        completed_date: NaiveDate,
    ) -> Result<(), SyncError> {
        self.db
            .connection()
            .execute(
                r"INSERT INTO completions (source_id, plan_type, completed_date, completed_at)
                  VALUES (?1, ?2, ?3, ?4)
                  ON CONFLICT(source_id, completed_date)
                  DO UPDATE SET plan_type = excluded.plan_type",
                params![
                    source_id,
                    plan_type.as_str(),
                    completed_date.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| SyncError::Database(format!("Failed to record completion: {e}")))?;
        Ok(())
    }

    /// Remove the completion of `source_id` on `completed_date`.
    ///
    /// Returns `false` if it was not completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn mark_uncompleted(
        &self,
        source_id: &str,
        completed_date: NaiveDate,
    ) -> Result<bool, SyncError> {
        let rows = self
            .db
            .connection()
            .execute(
                "DELETE FROM completions WHERE source_id = ?1 AND completed_date = ?2",
                params![source_id, completed_date.to_string()],
            )
            .map_err(|e| SyncError::Database(format!("Failed to remove completion: {e}")))?;
        Ok(rows > 0)
    }

    /// Whether `source_id` is completed on `completed_date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn is_completed(
        &self,
        source_id: &str,
        completed_date: NaiveDate,
    ) -> Result<bool, SyncError> {
        let count: i64 = self
            .db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM completions WHERE source_id = ?1 AND completed_date = ?2",
                params![source_id, completed_date.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| SyncError::Database(format!("Failed to query completion: {e}")))?;
        Ok(count > 0)
    }

    /// Completions, optionally limited to one day, newest day first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list(&self, on: Option<NaiveDate>) -> Result<Vec<CompletionRecord>, SyncError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                r"SELECT source_id, plan_type, completed_date, completed_at
                  FROM completions
                  WHERE ?1 IS NULL OR completed_date = ?1
                  ORDER BY completed_date DESC, plan_type ASC, source_id ASC",
            )
            .map_err(|e| SyncError::Database(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([on.map(|d| d.to_string())], row_to_record)
            .map_err(|e| SyncError::Database(format!("Failed to query completions: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| SyncError::Database(e.to_string()))?);
        }
        Ok(records)
    }
}

impl CompletionSink for CompletionLedger {
    fn push(&self, action: &QueuedAction) -> Result<(), SyncError> {
        match action.action {
            CompletionAction::Complete => {
                self.mark_completed(&action.source_id, action.plan_type, action.completed_date)
            }
            CompletionAction::Uncomplete => {
                self.mark_uncompleted(&action.source_id, action.completed_date)?;
                Ok(())
            }
        }
    }
}

fn row_to_record(row: &Row<'_>) -> Result<CompletionRecord, rusqlite::Error> {
    let source_id: String = row.get(0)?;
    let plan_type_str: String = row.get(1)?;
    let completed_date_str: String = row.get(2)?;
    let completed_at_str: String = row.get(3)?;

    let plan_type = plan_type_str.parse::<PlanType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let completed_date = NaiveDate::parse_from_str(&completed_date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let completed_at = DateTime::parse_from_rfc3339(&completed_at_str)
        .map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc));

    Ok(CompletionRecord {
        source_id,
        plan_type,
        completed_date,
        completed_at,
    })
}
