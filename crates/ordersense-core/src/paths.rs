//! File system paths for OrderSense.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Filename of the audit outbox database.
const AUDIT_DATABASE_NAME: &str = "ai_logs.sqlite";

/// Manages file system paths under the runtime directory (`~/.ordersense`).
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.ordersense`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".ordersense"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.ordersense).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.ordersense/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the audit outbox database path (~/.ordersense/ai_logs.sqlite).
    pub fn audit_database_file(&self) -> PathBuf {
        self.base_dir.join(AUDIT_DATABASE_NAME)
    }

    /// Get the logs directory (~/.ordersense/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path (~/.ordersense/logs/ordersense.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("ordersense.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
