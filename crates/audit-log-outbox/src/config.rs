//! Outbox tuning.

use std::time::Duration;

/// Configuration for the delivery worker and its lifecycle.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Longest idle wait between scans.
    pub flush_interval: Duration,
    /// Maximum events attempted per scan.
    pub max_batch: usize,
    /// Timeout for one upload attempt.
    pub attempt_timeout: Duration,
    /// How long `stop()` waits before aborting the worker task.
    pub join_timeout: Duration,
    /// From this many attempts on, each further failure is logged at
    /// error level. The event is still retried.
    pub stuck_after_tries: u32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(2),
            max_batch: 25,
            attempt_timeout: Duration::from_secs(10),
            join_timeout: Duration::from_secs(5),
            stuck_after_tries: 20,
        }
    }
}
