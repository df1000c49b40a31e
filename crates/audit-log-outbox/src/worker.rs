//! Background delivery of due audit events.

use crate::delivery::check_response;
use crate::{
    next_try_at_ms, now_ms, AuditRecord, AuditUploader, DeliveryError, OutboxConfig,
    OutboxResult, WakeSignal,
};
use audit_log_database::{AuditLogStore, LogEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of one scan of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Due events fetched.
    pub scanned: usize,
    /// Accepted by the endpoint and removed from the store.
    pub delivered: usize,
    pub failed: usize,
    /// True if the stop flag cut the batch short.
    pub interrupted: bool,
}

/// The single consumer of the outbox.
///
/// Events are attempted strictly one at a time, in the order the store
/// returns them. The stop flag is only checked between attempts.
pub struct DeliveryWorker {
    store: Arc<AuditLogStore>,
    uploader: Arc<dyn AuditUploader>,
    config: OutboxConfig,
    wake: WakeSignal,
    stop: Arc<AtomicBool>,
}

impl DeliveryWorker {
    pub fn new(
        store: Arc<AuditLogStore>,
        uploader: Arc<dyn AuditUploader>,
        config: OutboxConfig,
        wake: WakeSignal,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            uploader,
            config,
            wake,
            stop,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Run until the stop flag is set.
    pub async fn run(self) {
        info!(
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            max_batch = self.config.max_batch,
            "Audit delivery worker started"
        );

        while !self.stopped() {
            match self.flush_due().await {
                Ok(report) if report.scanned > 0 => {
                    debug!(
                        scanned = report.scanned,
                        delivered = report.delivered,
                        failed = report.failed,
                        "Audit flush complete"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Audit flush failed"),
            }

            if self.stopped() {
                break;
            }
            self.wake.wait(self.config.flush_interval).await;
        }

        info!("Audit delivery worker stopped");
    }

    /// Attempt every event that is due now, up to `max_batch`.
    ///
    /// Fails only if the due scan itself cannot read the store. Storage
    /// errors while recording an outcome are logged and the batch goes on.
    pub async fn flush_due(&self) -> OutboxResult<FlushReport> {
        let events = self.store.due_events(now_ms(), self.config.max_batch)?;
        let mut report = FlushReport {
            scanned: events.len(),
            ..Default::default()
        };

        for event in &events {
            if self.stopped() {
                report.interrupted = true;
                break;
            }

            match self.attempt(event).await {
                Ok(()) => match self.store.mark_delivered(&event.id) {
                    Ok(_) => {
                        report.delivered += 1;
                        info!(event_id = %event.id, tries = event.tries, "Audit event delivered");
                    }
                    Err(e) => error!(
                        event_id = %event.id,
                        error = %e,
                        "Could not remove delivered audit event, it will be sent again"
                    ),
                },
                Err(delivery_error) => {
                    report.failed += 1;
                    self.record_failure(event, &delivery_error);
                }
            }
        }

        Ok(report)
    }

    async fn attempt(&self, event: &LogEvent) -> Result<(), DeliveryError> {
        let payload = event
            .payload()
            .map_err(|e| DeliveryError::MalformedPayload(e.to_string()))?;
        let record = AuditRecord::from_payload(&payload)?;

        let response = tokio::time::timeout(self.config.attempt_timeout, self.uploader.upload(&record))
            .await
            .map_err(|_| DeliveryError::Timeout(self.config.attempt_timeout))??;

        check_response(&response)
    }

    fn record_failure(&self, event: &LogEvent, delivery_error: &DeliveryError) {
        let tries = event.tries.saturating_add(1);
        let next_try = next_try_at_ms(now_ms(), tries);
        let message = delivery_error.to_string();

        if tries >= self.config.stuck_after_tries {
            error!(
                event_id = %event.id,
                tries,
                created_at_ms = event.created_at_ms,
                error = %message,
                "Audit event keeps failing"
            );
        } else {
            warn!(
                event_id = %event.id,
                tries,
                next_try_at_ms = next_try,
                error = %message,
                "Audit delivery failed, will retry"
            );
        }

        if let Err(e) = self.store.mark_failed(&event.id, tries, next_try, &message) {
            error!(event_id = %event.id, error = %e, "Could not record audit delivery failure");
        }
    }
}
