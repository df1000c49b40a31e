//! Shared handles passed to the bot and the HTTP handlers.

use super::audit::ExchangeAuditUploader;
use super::bot::BotController;
use super::state::StateStore;
use anyhow::Context;
use audit_log_database::AuditLogStore;
use audit_log_outbox::{AuditOutbox, AuditUploader, OutboxConfig};
use exchange_client::{Credentials, ExchangeClient};
use ordersense_core::{Config, OutboxSettings};
use std::sync::Arc;
use std::time::Duration;

/// Everything a request handler or the bot loop needs. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub state: Arc<StateStore>,
    pub outbox: Arc<AuditOutbox>,
    pub exchange: Arc<ExchangeClient>,
    pub bot: Arc<BotController>,
}

impl AppContext {
    /// Wire the exchange client, the outbox and the bot state together.
    ///
    /// The outbox is built but not started.
    pub fn build(config: Config, store: Arc<AuditLogStore>) -> anyhow::Result<Self> {
        let credentials = Credentials {
            api_key: config.exchange.api_key.clone(),
            secret_key: config.exchange.secret_key.clone(),
            passphrase: config.exchange.passphrase.clone(),
        };
        let exchange = Arc::new(
            ExchangeClient::new(credentials, &config.exchange.base_url)
                .context("Failed to build exchange client")?,
        );

        let outbox_config = outbox_config(&config.outbox);
        let uploader: Arc<dyn AuditUploader> = Arc::new(ExchangeAuditUploader::new(
            Arc::clone(&exchange),
            outbox_config.attempt_timeout,
        ));

        Ok(Self::with_uploader(config, store, exchange, uploader))
    }

    /// Like [`AppContext::build`] with a caller-supplied uploader.
    pub fn with_uploader(
        config: Config,
        store: Arc<AuditLogStore>,
        exchange: Arc<ExchangeClient>,
        uploader: Arc<dyn AuditUploader>,
    ) -> Self {
        let outbox = AuditOutbox::new(store, uploader, outbox_config(&config.outbox));
        Self {
            state: Arc::new(StateStore::new(config.symbol.clone())),
            config: Arc::new(config),
            outbox: Arc::new(outbox),
            exchange,
            bot: Arc::new(BotController::new()),
        }
    }
}

pub fn outbox_config(settings: &OutboxSettings) -> OutboxConfig {
    OutboxConfig {
        flush_interval: Duration::from_millis(settings.flush_interval_ms),
        max_batch: settings.max_batch,
        attempt_timeout: Duration::from_millis(settings.attempt_timeout_ms),
        join_timeout: Duration::from_millis(settings.join_timeout_ms),
        stuck_after_tries: settings.stuck_after_tries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_config_from_settings() {
        let config = outbox_config(&OutboxSettings::default());
        assert_eq!(config.flush_interval, Duration::from_secs(2));
        assert_eq!(config.max_batch, 25);
        assert_eq!(config.attempt_timeout, Duration::from_secs(10));
        assert_eq!(config.join_timeout, Duration::from_secs(5));
        assert_eq!(config.stuck_after_tries, 20);
    }
}
