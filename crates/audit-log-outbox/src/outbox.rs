//! Producer-facing handle and worker lifecycle.

use crate::{now_ms, AuditUploader, DeliveryWorker, OutboxConfig, OutboxError, OutboxResult, WakeSignal};
use audit_log_database::{AuditLogStore, NewLogEvent};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct RunningWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Durable audit outbox.
///
/// `enqueue` may be called from any number of threads or tasks at once.
/// At most one delivery worker runs per outbox.
///
/// # Lifecycle
///
/// 1. Build with [`AuditOutbox::new()`]
/// 2. Call [`AuditOutbox::start()`] from inside a Tokio runtime
/// 3. Call [`AuditOutbox::enqueue()`] from producers
/// 4. Call [`AuditOutbox::stop()`] on shutdown; undelivered rows stay on
///    disk and are picked up after the next `start()`
pub struct AuditOutbox {
    store: Arc<AuditLogStore>,
    uploader: Arc<dyn AuditUploader>,
    config: OutboxConfig,
    wake: WakeSignal,
    worker: Mutex<Option<RunningWorker>>,
}

impl AuditOutbox {
    pub fn new(
        store: Arc<AuditLogStore>,
        uploader: Arc<dyn AuditUploader>,
        config: OutboxConfig,
    ) -> Self {
        Self {
            store,
            uploader,
            config,
            wake: WakeSignal::new(),
            worker: Mutex::new(None),
        }
    }

    /// Persist a payload and nudge the worker. Returns the new event id.
    ///
    /// The row is committed before this returns, whether or not a worker
    /// is running. Only storage failures are reported.
    pub fn enqueue<T>(&self, payload: &T) -> OutboxResult<String>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)?;
        let id = Uuid::new_v4().to_string();

        self.store
            .persist(&NewLogEvent::new(id.clone(), now_ms(), payload))?;
        self.wake.wake();

        debug!(event_id = %id, "Audit event enqueued");
        Ok(id)
    }

    /// Ensure the schema exists and launch the delivery worker.
    ///
    /// Does nothing if a worker is already running.
    pub fn start(&self) -> OutboxResult<()> {
        let mut slot = self.worker.lock();
        if let Some(running) = slot.as_ref() {
            if !running.handle.is_finished() {
                debug!("Audit delivery worker already running");
                return Ok(());
            }
        }

        self.store
            .ensure_schema()
            .map_err(|e| OutboxError::Configuration(format!("audit schema unavailable: {e}")))?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| OutboxError::Configuration(format!("no Tokio runtime: {e}")))?;

        let stop = Arc::new(AtomicBool::new(false));
        let worker = DeliveryWorker::new(
            Arc::clone(&self.store),
            Arc::clone(&self.uploader),
            self.config.clone(),
            self.wake.clone(),
            Arc::clone(&stop),
        );
        let handle = runtime.spawn(worker.run());

        *slot = Some(RunningWorker { stop, handle });
        info!(path = %self.store.path().display(), "Audit outbox started");
        Ok(())
    }

    /// Signal the worker to stop and wait up to the join timeout.
    ///
    /// Returns true if the worker exited on its own, false if it had to be
    /// aborted (or was not running). Pending rows are left in the store.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.worker.lock().take() else {
            return false;
        };

        running.stop.store(true, Ordering::SeqCst);
        self.wake.wake();

        let abort = running.handle.abort_handle();
        match tokio::time::timeout(self.config.join_timeout, running.handle).await {
            Ok(_) => {
                info!("Audit outbox stopped");
                true
            }
            Err(_) => {
                abort.abort();
                warn!(
                    join_timeout_ms = self.config.join_timeout.as_millis() as u64,
                    "Audit delivery worker did not stop in time, aborted"
                );
                false
            }
        }
    }

    /// Whether a delivery worker is currently running.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Number of events not yet delivered.
    pub fn pending_count(&self) -> OutboxResult<u64> {
        Ok(self.store.pending_count()?)
    }

    pub fn store(&self) -> &Arc<AuditLogStore> {
        &self.store
    }
}

impl Drop for AuditOutbox {
    fn drop(&mut self) {
        if let Some(running) = self.worker.get_mut().take() {
            running.stop.store(true, Ordering::SeqCst);
            self.wake.wake();
        }
    }
}
