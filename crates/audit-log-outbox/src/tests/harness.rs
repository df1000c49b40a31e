//! Test harness for outbox tests.

use crate::{
    AuditOutbox, AuditRecord, AuditUploader, DeliveryError, DeliveryWorker, OutboxConfig,
    WakeSignal,
};
use async_trait::async_trait;
use audit_log_database::{AuditLogStore, PoolConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// How the mock endpoint answers an upload.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 2xx JSON response with this `code`.
    Code(&'static str),
    /// 2xx JSON response without a `code` field.
    NoCode,
    /// 2xx response with exactly this body.
    Body(Value),
    /// Upload fails before a response is read.
    Fail(DeliveryError),
    /// Never answer.
    Hang,
}

/// Uploader that records every record it sees.
pub struct MockUploader {
    received: Mutex<Vec<AuditRecord>>,
    queued: Mutex<VecDeque<Reply>>,
    default_reply: Mutex<Reply>,
}

impl MockUploader {
    pub fn new(default_reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            queued: Mutex::new(VecDeque::new()),
            default_reply: Mutex::new(default_reply),
        })
    }

    pub fn set_default_reply(&self, reply: Reply) {
        *self.default_reply.lock() = reply;
    }

    /// Answer the next upload with `reply`, then fall back to the default.
    pub fn queue_reply(&self, reply: Reply) {
        self.queued.lock().push_back(reply);
    }

    pub fn received(&self) -> Vec<AuditRecord> {
        self.received.lock().clone()
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().len()
    }
}

#[async_trait]
impl AuditUploader for MockUploader {
    async fn upload(&self, record: &AuditRecord) -> Result<Value, DeliveryError> {
        self.received.lock().push(record.clone());
        let reply = self
            .queued
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_reply.lock().clone());

        match reply {
            Reply::Code(code) => Ok(json!({"code": code, "msg": "mock", "data": {}})),
            Reply::NoCode => Ok(json!({"data": {}})),
            Reply::Body(body) => Ok(body),
            Reply::Fail(e) => Err(e),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Short timings so lifecycle tests finish quickly.
pub fn fast_config() -> OutboxConfig {
    OutboxConfig {
        flush_interval: Duration::from_millis(50),
        max_batch: 25,
        attempt_timeout: Duration::from_millis(200),
        join_timeout: Duration::from_millis(500),
        stuck_after_tries: 3,
    }
}

/// A valid audit payload, tagged so tests can tell events apart.
pub fn payload(tag: &str) -> Value {
    json!({
        "stage": "Decision Making",
        "model": "ordersense-test",
        "input": {"tag": tag},
        "output": {"style": "post_only"},
        "explanation": format!("decision {tag}"),
    })
}

/// Outbox over a store in a temporary directory.
pub struct TestHarness {
    pub dir: TempDir,
    pub store: Arc<AuditLogStore>,
    pub uploader: Arc<MockUploader>,
    pub outbox: AuditOutbox,
    pub config: OutboxConfig,
}

impl TestHarness {
    pub fn new(reply: Reply) -> Self {
        Self::with_config(reply, fast_config())
    }

    pub fn with_config(reply: Reply, config: OutboxConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir.path().join("ai_logs.sqlite")));
        let uploader = MockUploader::new(reply);
        let outbox = AuditOutbox::new(store.clone(), uploader.clone(), config.clone());

        Self {
            dir,
            store,
            uploader,
            outbox,
            config,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("ai_logs.sqlite")
    }

    /// A standalone worker over the same store, for driving single flushes.
    pub fn worker(&self) -> DeliveryWorker {
        self.worker_with_stop(Arc::new(AtomicBool::new(false)))
    }

    pub fn worker_with_stop(&self, stop: Arc<AtomicBool>) -> DeliveryWorker {
        DeliveryWorker::new(
            self.store.clone(),
            self.uploader.clone(),
            self.config.clone(),
            WakeSignal::new(),
            stop,
        )
    }
}

pub fn open_store(path: &std::path::Path) -> AuditLogStore {
    AuditLogStore::open(path, PoolConfig::default()).unwrap()
}

/// Drop the events table behind the store's back, so every query on it
/// fails until [`restore_events_table`] runs.
pub fn drop_events_table(path: &std::path::Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.busy_timeout(Duration::from_secs(5)).unwrap();
    conn.execute_batch("DROP TABLE ai_log_events").unwrap();
}

/// Make every delete on the events table fail.
pub fn block_deletes(path: &std::path::Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.busy_timeout(Duration::from_secs(5)).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_deletes BEFORE DELETE ON ai_log_events
         BEGIN SELECT RAISE(ABORT, 'deletes blocked'); END",
    )
    .unwrap();
}

/// Forget the applied migrations and let the store recreate its schema.
pub fn restore_events_table(path: &std::path::Path, store: &AuditLogStore) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.busy_timeout(Duration::from_secs(5)).unwrap();
    conn.execute_batch("DELETE FROM migrations").unwrap();
    store.ensure_schema().unwrap();
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
