//! The durable queue handle shared by producers and the delivery worker.

use crate::{queries, DatabasePool, DatabaseResult, LogEvent, NewLogEvent, PoolConfig};
use std::path::Path;
use tracing::{debug, warn};

/// Durable store of pending audit events.
///
/// Every mutating call commits before it returns. The handle is `Sync`;
/// share it behind an `Arc`.
pub struct AuditLogStore {
    pool: DatabasePool,
}

impl AuditLogStore {
    /// Open the store at `path`, creating the file and schema if needed.
    pub fn open(path: &Path, config: PoolConfig) -> DatabaseResult<Self> {
        let pool = DatabasePool::open(path, config)?;
        Ok(Self { pool })
    }

    /// Create the schema if it is missing. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> DatabaseResult<()> {
        self.pool.migrate()
    }

    /// Insert a new pending event.
    pub fn persist(&self, event: &NewLogEvent) -> DatabaseResult<()> {
        let conn = self.pool.get()?;
        queries::insert_event(&conn, event)?;
        debug!(event_id = %event.id, "Audit event persisted");
        Ok(())
    }

    /// Up to `limit` events eligible at `now_ms`.
    pub fn due_events(&self, now_ms: i64, limit: usize) -> DatabaseResult<Vec<LogEvent>> {
        let conn = self.pool.get()?;
        queries::list_due_events(&conn, now_ms, limit)
    }

    /// Remove a delivered event. Returns false if it was already gone.
    pub fn mark_delivered(&self, id: &str) -> DatabaseResult<bool> {
        let conn = self.pool.get()?;
        let deleted = queries::delete_event(&conn, id)?;
        if !deleted {
            debug!(event_id = %id, "Delivered event already removed");
        }
        Ok(deleted)
    }

    /// Store the outcome of a failed attempt. Returns false if the event
    /// no longer exists.
    pub fn mark_failed(
        &self,
        id: &str,
        tries: u32,
        next_try_at_ms: i64,
        error: &str,
    ) -> DatabaseResult<bool> {
        let conn = self.pool.get()?;
        let updated = queries::record_failure(&conn, id, tries, next_try_at_ms, error)?;
        if !updated {
            warn!(event_id = %id, "Failed event not found, nothing to update");
        }
        Ok(updated)
    }

    /// Look up a single event.
    pub fn get_event(&self, id: &str) -> DatabaseResult<Option<LogEvent>> {
        let conn = self.pool.get()?;
        queries::get_event(&conn, id)
    }

    /// Number of events still waiting for delivery.
    pub fn pending_count(&self) -> DatabaseResult<u64> {
        let conn = self.pool.get()?;
        queries::count_events(&conn)
    }

    pub fn health_check(&self) -> DatabaseResult<()> {
        self.pool.health_check()
    }

    pub fn path(&self) -> &Path {
        self.pool.path()
    }
}
