//! OrderSense binary entry point.

use clap::Parser;
use ordersense_bin::app::{run_service, RunOptions};
use std::path::PathBuf;

/// OrderSense: execution bot with durable AI audit logging.
#[derive(Parser, Debug)]
#[command(name = "ordersense")]
#[command(about = "Execution-style bot that audits every decision to WEEX")]
#[command(version)]
struct Args {
    /// HTTP port
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Audit database file
    #[arg(long, env = "ORDERSENSE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Config file (defaults to ~/.ordersense/config.json)
    #[arg(long, env = "ORDERSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ORDERSENSE_LOG_LEVEL")]
    log_level: Option<String>,

    /// JSON log file (defaults to ~/.ordersense/logs/ordersense.jsonl)
    #[arg(long, env = "ORDERSENSE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    run_service(RunOptions {
        port: args.port,
        db_path: args.db_path,
        config_path: args.config,
        log_level: args.log_level,
        log_file: args.log_file,
    })
    .await
}
