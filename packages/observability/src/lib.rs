//! # Observability
//!
//! Logging setup for the OrderSense processes.
//!
//! Services call `observability::init()` (or `init_with_config()`) once at
//! startup and use the `tracing` macros everywhere else. Where the output
//! goes is decided here and nowhere else:
//!
//! - With a `log_path`, every event is appended as one JSON line to that
//!   file, so `tail -f ordersense.jsonl | jq` works as a live view.
//! - Without one, a compact human-readable formatter writes to stderr.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "ordersense".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("service started");
//! }
//! ```

mod file;
mod json_layer;

use std::path::PathBuf;

pub use file::CentralLogWriter;
pub use json_layer::LogEntry;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSON log line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSONL log file. When unset, logs go to stderr only.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr when writing to a file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Falls back to stderr-only logging if the log file cannot be opened.
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_with_config(config: LogConfig) {
    match config.log_path.clone() {
        Some(path) => {
            if let Err(e) = file::init_file_subscriber(&config, &path) {
                init_stderr_subscriber(&config);
                tracing::warn!(
                    log_path = %path.display(),
                    error = %e,
                    "could not open log file, logging to stderr"
                );
            }
        }
        None => init_stderr_subscriber(&config),
    }
}

fn init_stderr_subscriber(config: &LogConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.default_level))
        .with_target(true)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}

pub(crate) fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("first");
        init("second");
    }
}
