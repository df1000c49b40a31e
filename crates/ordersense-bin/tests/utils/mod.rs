use audit_log_database::{AuditLogStore, PoolConfig};
use ordersense_bin::app::AppContext;
use ordersense_bin::http::Server;
use ordersense_core::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestServer {
    pub base_url: String,
    pub ctx: AppContext,
    _dir: TempDir,
}

/// Serve the API on a free port, in dry-run mode, against an exchange
/// address that refuses connections. The outbox is left stopped so audit
/// rows stay countable.
pub async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        AuditLogStore::open(&dir.path().join("ai_logs.sqlite"), PoolConfig::default()).unwrap(),
    );

    let mut config = Config::new();
    config.dry_run = true;
    config.exchange.base_url = "http://127.0.0.1:1".to_string();

    let ctx = AppContext::build(config, store).unwrap();
    let server = Server::bind(ctx.clone(), SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();

    let port = server.port();
    tokio::spawn(server.run());

    TestServer {
        base_url: format!("http://127.0.0.1:{port}"),
        ctx,
        _dir: dir,
    }
}

pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}
