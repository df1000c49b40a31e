//! Configuration management.
//!
//! Values come from three layers, later ones winning: built-in defaults,
//! an optional JSON config file, then environment variables.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default exchange REST endpoint.
pub const DEFAULT_EXCHANGE_BASE_URL: &str = "https://api-contract.weex.com";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Exchange API credentials and endpoint.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExchangeSettings {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub base_url: String,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            passphrase: String::new(),
            base_url: DEFAULT_EXCHANGE_BASE_URL.to_string(),
        }
    }
}

// Credentials never end up in logs.
impl std::fmt::Debug for ExchangeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeSettings")
            .field("api_key_set", &!self.api_key.is_empty())
            .field("secret_key_set", &!self.secret_key.is_empty())
            .field("passphrase_set", &!self.passphrase.is_empty())
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Tuning for the audit outbox delivery worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutboxSettings {
    /// Maximum wait between due-scans when no wake arrives.
    pub flush_interval_ms: u64,
    /// Maximum events attempted per scan.
    pub max_batch: usize,
    /// Timeout for a single delivery attempt.
    pub attempt_timeout_ms: u64,
    /// How long `stop()` waits for the worker to exit.
    pub join_timeout_ms: u64,
    /// Attempt count after which failures are logged as stuck events.
    pub stuck_after_tries: u32,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            flush_interval_ms: 2_000,
            max_batch: 25,
            attempt_timeout_ms: 10_000,
            join_timeout_ms: 5_000,
            stuck_after_tries: 20,
        }
    }
}

/// Main process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    pub exchange: ExchangeSettings,
    /// Model name recorded on every audit payload.
    pub model_name: String,
    /// When true, orders are simulated instead of sent to the exchange.
    pub dry_run: bool,
    pub symbol: String,
    pub order_size: String,
    pub http_port: u16,
    /// Audit database location. Defaults to `Paths::audit_database_file`.
    pub database_path: Option<PathBuf>,
    pub outbox: OutboxSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            exchange: ExchangeSettings::default(),
            model_name: "ordersense-v1".to_string(),
            dry_run: true,
            symbol: "cmt_btcusdt".to_string(),
            order_size: "0.001".to_string(),
            http_port: 8000,
            database_path: None,
            outbox: OutboxSettings::default(),
        }
    }
}

impl Config {
    /// Create a Config from defaults, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load the config file under `paths` if present, then apply the
    /// environment.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        Self::load_with_file(&paths.config_file())
    }

    /// Load a specific config file if it exists, then apply the environment.
    pub fn load_with_file(config_path: &Path) -> CoreResult<Self> {
        let mut config = if config_path.exists() {
            Self::load_from_file(config_path)?
        } else {
            Self::default()
        };
        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the audit database path.
    pub fn database_path(&self, paths: &Paths) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| paths.audit_database_file())
    }

    /// Get the exchange base URL as a parsed URL.
    pub fn exchange_url(&self) -> CoreResult<Url> {
        Url::parse(&self.exchange.base_url).map_err(CoreError::from)
    }

    /// Reject settings the outbox cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        self.exchange_url()?;
        if self.outbox.max_batch == 0 {
            return Err(CoreError::Config("outbox.max_batch must be at least 1".into()));
        }
        if self.outbox.flush_interval_ms == 0 {
            return Err(CoreError::Config(
                "outbox.flush_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup. Unparseable numbers are
    /// ignored and the previous value is kept.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ORDERSENSE_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("WEEX_API_KEY") {
            self.exchange.api_key = v;
        }
        if let Some(v) = lookup("WEEX_SECRET_KEY") {
            self.exchange.secret_key = v;
        }
        if let Some(v) = lookup("WEEX_PASSPHRASE") {
            self.exchange.passphrase = v;
        }
        if let Some(v) = lookup("WEEX_BASE_URL") {
            self.exchange.base_url = v;
        }
        if let Some(v) = lookup("MODEL_NAME") {
            self.model_name = v;
        }
        if let Some(v) = lookup("DRY_RUN") {
            self.dry_run = parse_bool(&v);
        }
        if let Some(v) = lookup("SYMBOL") {
            self.symbol = v;
        }
        if let Some(v) = lookup("ORDER_SIZE") {
            self.order_size = v;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.trim().parse().ok()) {
            self.http_port = port;
        }
        if let Some(v) = lookup("ORDERSENSE_DB_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
