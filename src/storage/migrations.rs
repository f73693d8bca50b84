//! Database migrations for metabolikal-sync.
//!
//! Each migration upgrades the schema by one version. The version lives in
//! `PRAGMA user_version`; migrations run when the database is opened.

use rusqlite::Connection;

use crate::error::SyncError;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Get the current schema version from the database.
///
/// Returns 0 for a new database.
pub fn get_version(conn: &Connection) -> Result<i32, SyncError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| SyncError::Database(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), SyncError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| SyncError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), SyncError> {
    let current = get_version(conn)?;

    if current > CURRENT_VERSION {
        return Err(SyncError::Database(format!(
            "Database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    for version in (current + 1)..=CURRENT_VERSION {
        tracing::debug!(version, "running database migration");
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), SyncError> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(SyncError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: key-value table backing the queue blob.
fn migrate_v1(conn: &Connection) -> Result<(), SyncError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| SyncError::Database(format!("Migration v1 failed: {e}")))
}

/// Migration v2: ledger of confirmed completions.
///
/// One row per `(source_id, completed_date)`, mirroring the backend's
/// per-plan completion tables.
fn migrate_v2(conn: &Connection) -> Result<(), SyncError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS completions (
            source_id TEXT NOT NULL,
            plan_type TEXT NOT NULL,
            completed_date TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            PRIMARY KEY (source_id, completed_date)
        );

        CREATE INDEX IF NOT EXISTS idx_completions_date
        ON completions(completed_date);
        ",
    )
    .map_err(|e| SyncError::Database(format!("Migration v2 failed: {e}")))
}
