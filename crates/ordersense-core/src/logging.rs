//! Logging initialization.
//!
//! Thin wrapper over the observability crate so every OrderSense binary
//! tags its lines with the same service name.

use std::path::PathBuf;

/// Service name written into every structured log line.
pub const SERVICE_NAME: &str = "ordersense";

/// Initialize the logging system.
///
/// With `log_file`, events are appended as JSON lines and mirrored to
/// stderr in compact form. Without it, only stderr is used. `RUST_LOG`
/// overrides `level` when set.
///
/// ```ignore
/// init_logging("info", None);
/// tracing::info!("server started");
/// ```
pub fn init_logging(level: &str, log_file: Option<PathBuf>) {
    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: log_file,
        also_stderr: true,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
