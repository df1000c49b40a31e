//! Single-slot wake-up between producers and the delivery worker.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Coalescing wake signal.
///
/// Any number of `wake()` calls made while the worker is busy collapse
/// into one stored permit, so the next `wait()` returns immediately and
/// the worker rescans the store once.
#[derive(Debug, Clone, Default)]
pub struct WakeSignal {
    notify: Arc<Notify>,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a wake. Never blocks.
    pub fn wake(&self) {
        self.notify.notify_one();
    }

    /// Wait for a wake or until `timeout` elapses. Returns true if woken.
    pub async fn wait(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.notify.notified())
            .await
            .is_ok()
    }
}
