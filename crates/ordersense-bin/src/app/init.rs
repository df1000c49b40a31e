//! Process startup and shutdown.

use super::context::AppContext;
use crate::http::Server;
use anyhow::Context;
use audit_log_database::{AuditLogStore, PoolConfig};
use ordersense_core::{init_logging, Config, Paths};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long shutdown waits for an in-flight bot tick.
const BOT_STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Command-line overrides applied on top of the loaded config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Load config, open the audit store, start the outbox and serve HTTP
/// until Ctrl-C.
pub async fn run_service(options: RunOptions) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let mut config = match &options.config_path {
        Some(path) => Config::load_with_file(path),
        None => Config::load(&paths),
    }
    .context("Failed to load configuration")?;

    if let Some(port) = options.port {
        config.http_port = port;
    }
    if let Some(db_path) = &options.db_path {
        config.database_path = Some(db_path.clone());
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone();
    }

    paths.ensure_dirs()?;
    let log_file = options.log_file.clone().unwrap_or_else(|| paths.log_file());
    init_logging(&config.log_level, Some(log_file));

    info!(
        symbol = %config.symbol,
        dry_run = config.dry_run,
        exchange = ?config.exchange,
        "OrderSense starting"
    );

    let db_path = config.database_path(&paths);
    let store = Arc::new(
        AuditLogStore::open(&db_path, PoolConfig::default())
            .with_context(|| format!("Failed to open audit store at {}", db_path.display()))?,
    );
    match store.pending_count() {
        Ok(pending) if pending > 0 => info!(pending, "Resuming delivery of stored audit events"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Could not count stored audit events"),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let ctx = AppContext::build(config, store)?;
    ctx.outbox.start()?;

    let server = Server::bind(ctx.clone(), addr).await?;
    info!(port = server.port(), "OrderSense backend running");

    let served = server.run_until(shutdown_signal()).await;
    if let Err(e) = &served {
        error!(error = %e, "HTTP server failed");
    }

    shutdown(&ctx).await;
    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
    }
}

/// Stop the bot, then the outbox. Undelivered events stay on disk.
pub async fn shutdown(ctx: &AppContext) {
    if ctx.state.is_running() {
        ctx.bot.stop_and_wait(ctx, BOT_STOP_TIMEOUT).await;
    }

    if !ctx.outbox.stop().await {
        warn!("Audit outbox worker was aborted or not running");
    }

    match ctx.outbox.pending_count() {
        Ok(pending) => info!(pending, "Audit events left for next start"),
        Err(e) => warn!(error = %e, "Could not count pending audit events"),
    }
}
