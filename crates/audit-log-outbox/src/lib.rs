//! Outbox pattern for audit records.
//!
//! Producers call [`AuditOutbox::enqueue`], which commits the payload to
//! SQLite and nudges a single background [`DeliveryWorker`]. The worker
//! scans due rows, hands each one to an [`AuditUploader`], and deletes it
//! on success or reschedules it with exponential backoff on failure.
//! Rows survive restarts, so delivery is at-least-once.
//!
//! ```text
//! producer ──enqueue──▶ ai_log_events ◀──scan/update── DeliveryWorker ──▶ AuditUploader
//!     │                                                      ▲
//!     └──────────────────── WakeSignal ──────────────────────┘
//! ```

mod backoff;
mod config;
mod delivery;
mod error;
mod outbox;
mod wake;
mod worker;

#[cfg(test)]
mod tests;

pub use backoff::{backoff_seconds, next_try_at_ms, now_ms, MAX_BACKOFF_SECS};
pub use config::OutboxConfig;
pub use delivery::{response_code, AuditRecord, AuditUploader, MAX_EXPLANATION_CHARS, SUCCESS_CODE};
pub use error::{DeliveryError, OutboxError, OutboxResult};
pub use outbox::AuditOutbox;
pub use wake::WakeSignal;
pub use worker::{DeliveryWorker, FlushReport};
