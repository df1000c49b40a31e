//! Single-flush behavior.

use super::harness::{payload, Reply, TestHarness};
use crate::{now_ms, DeliveryError, FlushReport};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_rejected_code_schedules_retry() {
    let harness = TestHarness::new(Reply::Code("30001"));
    let id = harness.outbox.enqueue(&payload("a")).unwrap();

    let before = now_ms();
    let report = harness.worker().flush_due().await.unwrap();
    let after = now_ms();

    assert_eq!(
        report,
        FlushReport {
            scanned: 1,
            delivered: 0,
            failed: 1,
            interrupted: false
        }
    );

    let event = harness.store.get_event(&id).unwrap().unwrap();
    assert_eq!(event.tries, 1);
    assert!(event.next_try_at_ms >= before + 2_000);
    assert!(event.next_try_at_ms <= after + 2_000);
    assert!(event.last_error.unwrap().contains("30001"));
}

#[tokio::test]
async fn test_success_code_deletes_row() {
    let harness = TestHarness::new(Reply::Code("00000"));
    let id = harness.outbox.enqueue(&payload("b")).unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.delivered, 1);
    assert!(harness.store.get_event(&id).unwrap().is_none());
    assert_eq!(harness.outbox.pending_count().unwrap(), 0);

    let received = harness.uploader.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].input, json!({"tag": "b"}));
}

#[tokio::test]
async fn test_missing_or_empty_code_counts_as_success() {
    let harness = TestHarness::new(Reply::NoCode);
    harness.uploader.queue_reply(Reply::Code(""));
    harness.outbox.enqueue(&payload("empty")).unwrap();
    harness.outbox.enqueue(&payload("none")).unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.delivered, 2);
    assert_eq!(harness.outbox.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_null_code_keeps_row_for_retry() {
    let harness = TestHarness::new(Reply::Body(json!({"code": null, "msg": "?"})));
    let id = harness.outbox.enqueue(&payload("null")).unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 1);
    let event = harness.store.get_event(&id).unwrap().unwrap();
    assert_eq!(event.tries, 1);
    assert!(event.last_error.unwrap().contains("null `code`"));
}

#[tokio::test]
async fn test_null_explanation_is_sent_empty() {
    let harness = TestHarness::new(Reply::Code("00000"));
    let mut body = payload("quiet");
    body["explanation"] = serde_json::Value::Null;
    harness.outbox.enqueue(&body).unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(harness.uploader.received()[0].explanation, "");
    assert_eq!(harness.outbox.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_delivered_row_is_not_sent_again() {
    let harness = TestHarness::new(Reply::Code("00000"));
    harness.outbox.enqueue(&payload("once")).unwrap();

    let worker = harness.worker();
    worker.flush_due().await.unwrap();
    let second = worker.flush_due().await.unwrap();

    assert_eq!(second.scanned, 0);
    assert_eq!(harness.uploader.received_count(), 1);
}

#[tokio::test]
async fn test_transport_error_is_a_failed_attempt() {
    let harness = TestHarness::new(Reply::Fail(DeliveryError::Transport(
        "connection refused".into(),
    )));
    let id = harness.outbox.enqueue(&payload("t")).unwrap();

    harness.worker().flush_due().await.unwrap();

    let event = harness.store.get_event(&id).unwrap().unwrap();
    assert_eq!(event.tries, 1);
    assert!(event.last_error.unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_malformed_payload_is_retried_not_dropped() {
    let harness = TestHarness::new(Reply::Code("00000"));
    let id = harness
        .outbox
        .enqueue(&json!({"stage": "Decision Making"}))
        .unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(harness.uploader.received_count(), 0);
    let event = harness.store.get_event(&id).unwrap().unwrap();
    assert_eq!(event.tries, 1);
    assert!(event.last_error.unwrap().starts_with("Malformed payload"));
}

#[tokio::test]
async fn test_hanging_upload_times_out() {
    let harness = TestHarness::new(Reply::Hang);
    let id = harness.outbox.enqueue(&payload("slow")).unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.failed, 1);
    let event = harness.store.get_event(&id).unwrap().unwrap();
    assert!(event.last_error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_stuck_events_are_kept() {
    let harness = TestHarness::new(Reply::Code("30001"));
    let id = harness.outbox.enqueue(&payload("stuck")).unwrap();

    // Push past stuck_after_tries by hand; every failure still reschedules.
    harness
        .store
        .mark_failed(&id, harness.config.stuck_after_tries + 5, 0, "earlier failure")
        .unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.failed, 1);
    let event = harness.store.get_event(&id).unwrap().unwrap();
    assert_eq!(event.tries, harness.config.stuck_after_tries + 6);
    assert!(event.next_try_at_ms > now_ms() + 59_000);
}

#[tokio::test]
async fn test_not_yet_due_rows_are_skipped() {
    let harness = TestHarness::new(Reply::Code("00000"));
    let id = harness.outbox.enqueue(&payload("later")).unwrap();
    harness
        .store
        .mark_failed(&id, 1, now_ms() + 60_000, "wait")
        .unwrap();

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.scanned, 0);
    assert_eq!(harness.uploader.received_count(), 0);
}

#[tokio::test]
async fn test_stop_flag_checked_between_attempts() {
    let harness = TestHarness::new(Reply::Code("00000"));
    for i in 0..3 {
        harness.outbox.enqueue(&payload(&i.to_string())).unwrap();
    }

    let stop = Arc::new(AtomicBool::new(true));
    let report = harness.worker_with_stop(stop.clone()).flush_due().await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.delivered, 0);
    assert!(report.interrupted);
    assert_eq!(harness.outbox.pending_count().unwrap(), 3);

    stop.store(false, Ordering::SeqCst);
    let report = harness.worker_with_stop(stop).flush_due().await.unwrap();
    assert_eq!(report.delivered, 3);
}

#[tokio::test]
async fn test_batch_limit() {
    let mut config = super::harness::fast_config();
    config.max_batch = 2;
    let harness = TestHarness::with_config(Reply::Code("00000"), config);
    for i in 0..5 {
        harness.outbox.enqueue(&payload(&i.to_string())).unwrap();
    }

    let report = harness.worker().flush_due().await.unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(harness.outbox.pending_count().unwrap(), 3);
}
