//! Core configuration and utilities shared by the OrderSense crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, ExchangeSettings, OutboxSettings, DEFAULT_EXCHANGE_BASE_URL, DEFAULT_LOG_LEVEL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level, SERVICE_NAME};
pub use paths::Paths;
