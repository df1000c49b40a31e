//! Outbox error types.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of the outbox.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// The durable store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] audit_log_database::DatabaseError),

    /// Schema or initialization failure at start-up.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;

/// Why a single delivery attempt failed.
///
/// Never returned to producers. Its text is stored as `last_error` and
/// the event is rescheduled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Audit endpoint rejected record with code {code}: {response}")]
    Rejected { code: String, response: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Delivery attempt timed out after {0:?}")]
    Timeout(Duration),
}
