//! SQLite storage for the audit log outbox.
//!
//! Pending audit events live in a single `ai_log_events` table. Producers
//! insert rows, the delivery worker reads the due ones and then either
//! deletes them (delivered) or pushes their next attempt into the future
//! (failed).
//!
//! # Architecture
//!
//! `AuditLogStore` wraps a `DatabasePool` (r2d2, WAL mode) and exposes
//! the queue operations. The SQL itself lives in [`queries`] as free
//! functions over a `&Connection`, so it can run on a pooled connection
//! or inside a transaction.
//!
//! ```ignore
//! let store = AuditLogStore::open(&path, PoolConfig::default())?;
//! store.persist(&NewLogEvent::new(id, now_ms, payload))?;
//! for event in store.due_events(now_ms, 25)? {
//!     // deliver, then mark_delivered or mark_failed
//! }
//! ```

mod error;
mod migrations;
mod models;
mod pool;
pub mod queries;
mod store;

pub use error::{DatabaseError, DatabaseResult};
pub use migrations::{run_migrations, CURRENT_VERSION};
pub use models::{LogEvent, NewLogEvent, MAX_LAST_ERROR_CHARS};
pub use pool::{DatabasePool, PoolConfig};
pub use store::AuditLogStore;
