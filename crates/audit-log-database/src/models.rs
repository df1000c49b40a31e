//! Database model types.

use crate::DatabaseResult;
use serde::{Deserialize, Serialize};

/// Longest `last_error` kept on a row, in characters.
pub const MAX_LAST_ERROR_CHARS: usize = 500;

/// A pending audit event as stored in `ai_log_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Insertion order.
    pub seq: i64,
    pub id: String,
    pub created_at_ms: i64,
    pub next_try_at_ms: i64,
    pub tries: u32,
    /// Serialized payload, exactly as the producer handed it in.
    pub payload_json: String,
    pub last_error: Option<String>,
}

impl LogEvent {
    /// Parse the stored payload.
    pub fn payload(&self) -> DatabaseResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.payload_json)?)
    }
}

/// Input for inserting a new event.
#[derive(Debug, Clone)]
pub struct NewLogEvent {
    pub id: String,
    pub created_at_ms: i64,
    pub payload: serde_json::Value,
}

impl NewLogEvent {
    pub fn new(id: impl Into<String>, created_at_ms: i64, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            created_at_ms,
            payload,
        }
    }
}

/// Cut an error message down to [`MAX_LAST_ERROR_CHARS`] characters.
pub(crate) fn truncate_error(error: &str) -> String {
    error.chars().take(MAX_LAST_ERROR_CHARS).collect()
}
