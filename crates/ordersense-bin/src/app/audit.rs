//! Audit payloads and the uploader that sends them to WEEX.

use async_trait::async_trait;
use audit_log_outbox::{AuditRecord, AuditUploader, DeliveryError, MAX_EXPLANATION_CHARS};
use exchange_client::{AiLogUpload, ExchangeClient, ExchangeError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const STAGE_DECISION: &str = "Decision Making";
pub const STAGE_ORDER: &str = "Order Placement";

/// The payload stored in the outbox for one decision or order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiLogEntry {
    pub stage: String,
    pub model: String,
    pub input: Value,
    pub output: Value,
    pub explanation: String,
    #[serde(rename = "orderId")]
    pub order_id: Option<i64>,
}

impl AiLogEntry {
    pub fn new(
        stage: &str,
        model: &str,
        input: Value,
        output: Value,
        explanation: &str,
    ) -> Self {
        Self {
            stage: stage.to_string(),
            model: model.to_string(),
            input,
            output,
            explanation: explanation.chars().take(MAX_EXPLANATION_CHARS).collect(),
            order_id: None,
        }
    }

    pub fn with_order_id(mut self, order_id: Option<i64>) -> Self {
        self.order_id = order_id;
        self
    }
}

/// Sends audit records through the signed `uploadAiLog` endpoint.
pub struct ExchangeAuditUploader {
    client: Arc<ExchangeClient>,
    timeout: Duration,
}

impl ExchangeAuditUploader {
    pub fn new(client: Arc<ExchangeClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl AuditUploader for ExchangeAuditUploader {
    async fn upload(&self, record: &AuditRecord) -> Result<Value, DeliveryError> {
        let upload = AiLogUpload {
            order_id: record.order_id,
            stage: record.stage.clone(),
            model: record.model.clone(),
            input: record.input.clone(),
            output: record.output.clone(),
            explanation: record.explanation.clone(),
        };

        self.client
            .upload_ai_log(&upload, self.timeout)
            .await
            .map_err(delivery_error)
    }
}

fn delivery_error(error: ExchangeError) -> DeliveryError {
    match &error {
        ExchangeError::Http(e) if e.is_timeout() => {
            DeliveryError::Transport(format!("request timed out: {e}"))
        }
        ExchangeError::NonJson { .. } | ExchangeError::InvalidResponse(_) => {
            DeliveryError::MalformedResponse(error.to_string())
        }
        _ => DeliveryError::Transport(error.to_string()),
    }
}
