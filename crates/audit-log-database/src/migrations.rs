//! Database migrations.
//!
//! Migrations are run in order and tracked in the `migrations` table.
//! Every statement is idempotent so running them on an up-to-date file
//! is a no-op.

use crate::{DatabaseError, DatabaseResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version > CURRENT_VERSION {
        return Err(DatabaseError::Migration(format!(
            "database schema v{current_version} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    if current_version == CURRENT_VERSION {
        debug!(current_version, "Schema up to date");
        return Ok(());
    }

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version < 1 {
        migrate_v1_ai_log_events(conn)?;
    }

    info!("Migrations complete");
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> DatabaseResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: pending audit events.
///
/// `seq` records insertion order and breaks ties between rows that share
/// the same `next_try_at_ms`.
fn migrate_v1_ai_log_events(conn: &Connection) -> DatabaseResult<()> {
    info!("Applying migration v1: ai_log_events");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ai_log_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            created_at_ms INTEGER NOT NULL,
            next_try_at_ms INTEGER NOT NULL,
            tries INTEGER NOT NULL DEFAULT 0 CHECK (tries >= 0),
            payload_json TEXT NOT NULL,
            last_error TEXT,
            CHECK (next_try_at_ms >= created_at_ms)
        );

        CREATE INDEX IF NOT EXISTS idx_ai_log_events_due
            ON ai_log_events(next_try_at_ms, seq);
        ",
    )?;

    record_migration(conn, 1, "ai_log_events")
}
