//! Standalone query functions that work with any Connection.
//!
//! Each function takes a `&Connection` as its first parameter, so the
//! same SQL runs on a pooled connection or inside a transaction.

use crate::models::truncate_error;
use crate::{DatabaseResult, LogEvent, NewLogEvent};
use rusqlite::{params, Connection, Row};

const SELECT_COLUMNS: &str =
    "seq, id, created_at_ms, next_try_at_ms, tries, payload_json, last_error";

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<LogEvent> {
    Ok(LogEvent {
        seq: row.get(0)?,
        id: row.get(1)?,
        created_at_ms: row.get(2)?,
        next_try_at_ms: row.get(3)?,
        tries: row.get(4)?,
        payload_json: row.get(5)?,
        last_error: row.get(6)?,
    })
}

/// Insert a new event, eligible immediately and with no attempts.
pub fn insert_event(conn: &Connection, event: &NewLogEvent) -> DatabaseResult<()> {
    let payload_json = serde_json::to_string(&event.payload)?;
    conn.execute(
        "INSERT INTO ai_log_events (id, created_at_ms, next_try_at_ms, tries, payload_json, last_error)
         VALUES (?1, ?2, ?2, 0, ?3, NULL)",
        params![event.id, event.created_at_ms, payload_json],
    )?;
    Ok(())
}

/// Events with `next_try_at_ms <= now_ms`, oldest eligibility first, then
/// insertion order.
pub fn list_due_events(conn: &Connection, now_ms: i64, limit: usize) -> DatabaseResult<Vec<LogEvent>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {SELECT_COLUMNS}
         FROM ai_log_events
         WHERE next_try_at_ms <= ?1
         ORDER BY next_try_at_ms ASC, seq ASC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let rows = stmt
        .query_map(params![now_ms, limit], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Get one event by id.
pub fn get_event(conn: &Connection, id: &str) -> DatabaseResult<Option<LogEvent>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM ai_log_events WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;

    match stmt.query_row(params![id], row_to_event) {
        Ok(event) => Ok(Some(event)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Delete a delivered event. Returns whether a row was removed.
pub fn delete_event(conn: &Connection, id: &str) -> DatabaseResult<bool> {
    let rows = conn.execute("DELETE FROM ai_log_events WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Record a failed attempt. Returns whether a row was updated.
///
/// `next_try_at_ms` never moves before the row's `created_at_ms`.
pub fn record_failure(
    conn: &Connection,
    id: &str,
    tries: u32,
    next_try_at_ms: i64,
    error: &str,
) -> DatabaseResult<bool> {
    let error = truncate_error(error);
    let rows = conn.execute(
        "UPDATE ai_log_events
         SET tries = ?2,
             next_try_at_ms = MAX(?3, created_at_ms),
             last_error = ?4
         WHERE id = ?1",
        params![id, tries, next_try_at_ms, error],
    )?;
    Ok(rows > 0)
}

/// Number of events not yet delivered.
pub fn count_events(conn: &Connection) -> DatabaseResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM ai_log_events", [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_migrations;
    use serde_json::json;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_sets_initial_bookkeeping() {
        let conn = conn();
        insert_event(&conn, &NewLogEvent::new("e1", 1_000, json!({"stage": "s"}))).unwrap();

        let event = get_event(&conn, "e1").unwrap().unwrap();
        assert_eq!(event.created_at_ms, 1_000);
        assert_eq!(event.next_try_at_ms, 1_000);
        assert_eq!(event.tries, 0);
        assert_eq!(event.last_error, None);
        assert_eq!(event.payload().unwrap(), json!({"stage": "s"}));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let conn = conn();
        let event = NewLogEvent::new("dup", 1_000, json!({}));
        insert_event(&conn, &event).unwrap();
        assert!(insert_event(&conn, &event).is_err());
        assert_eq!(count_events(&conn).unwrap(), 1);
    }

    #[test]
    fn test_due_orders_by_next_try_then_insertion() {
        let conn = conn();
        insert_event(&conn, &NewLogEvent::new("late", 3_000, json!({}))).unwrap();
        insert_event(&conn, &NewLogEvent::new("first", 1_000, json!({}))).unwrap();
        insert_event(&conn, &NewLogEvent::new("second", 1_000, json!({}))).unwrap();

        let ids: Vec<_> = list_due_events(&conn, 5_000, 10)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let conn = conn();
        insert_event(&conn, &NewLogEvent::new("e1", 0, json!({}))).unwrap();
        assert!(list_due_events(&conn, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn test_record_failure_clamps_and_truncates() {
        let conn = conn();
        insert_event(&conn, &NewLogEvent::new("e1", 10_000, json!({}))).unwrap();

        let long_error = "x".repeat(2_000);
        assert!(record_failure(&conn, "e1", 1, 5_000, &long_error).unwrap());

        let event = get_event(&conn, "e1").unwrap().unwrap();
        assert_eq!(event.tries, 1);
        assert_eq!(event.next_try_at_ms, 10_000);
        assert_eq!(event.last_error.unwrap().len(), 500);
    }

    #[test]
    fn test_missing_rows_are_noops() {
        let conn = conn();
        assert!(!delete_event(&conn, "missing").unwrap());
        assert!(!record_failure(&conn, "missing", 1, 0, "boom").unwrap());
        assert!(get_event(&conn, "missing").unwrap().is_none());
    }
}
