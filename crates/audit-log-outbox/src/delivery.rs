//! The remote audit endpoint, as seen by the worker.

use crate::DeliveryError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Response code the endpoint uses for an accepted record.
pub const SUCCESS_CODE: &str = "00000";

/// Longest explanation sent upstream, in characters.
pub const MAX_EXPLANATION_CHARS: usize = 1000;

/// One audit record as sent to the endpoint.
///
/// Built from the stored payload at delivery time; the payload itself is
/// kept untyped at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub stage: String,
    pub model: String,
    pub input: Value,
    pub output: Value,
    /// A null or missing explanation is sent as an empty string.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
}

impl AuditRecord {
    /// Build a record from a stored payload.
    ///
    /// `input` and `output` must be JSON objects. The explanation is cut
    /// to [`MAX_EXPLANATION_CHARS`].
    pub fn from_payload(payload: &Value) -> Result<Self, DeliveryError> {
        let mut record: AuditRecord = serde_json::from_value(payload.clone())
            .map_err(|e| DeliveryError::MalformedPayload(e.to_string()))?;

        if !record.input.is_object() {
            return Err(DeliveryError::MalformedPayload(
                "`input` must be a JSON object".to_string(),
            ));
        }
        if !record.output.is_object() {
            return Err(DeliveryError::MalformedPayload(
                "`output` must be a JSON object".to_string(),
            ));
        }

        if record.explanation.chars().count() > MAX_EXPLANATION_CHARS {
            record.explanation = record
                .explanation
                .chars()
                .take(MAX_EXPLANATION_CHARS)
                .collect();
        }

        Ok(record)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Uploads one audit record.
///
/// Implementations return the endpoint's JSON response on any 2xx reply;
/// the worker decides success from its `code`. Transport errors, non-2xx
/// statuses and non-JSON bodies are returned as `DeliveryError`.
#[async_trait]
pub trait AuditUploader: Send + Sync {
    async fn upload(&self, record: &AuditRecord) -> Result<Value, DeliveryError>;
}

/// The `code` field of a response, if any.
///
/// Accepts a string or a number. A missing code is `None`; a null code
/// is malformed, since the endpoint never confirmed the record.
pub fn response_code(response: &Value) -> Result<Option<String>, DeliveryError> {
    let object = response.as_object().ok_or_else(|| {
        DeliveryError::MalformedResponse(format!("expected a JSON object, got {response}"))
    })?;

    match object.get("code") {
        None => Ok(None),
        Some(Value::Null) => Err(DeliveryError::MalformedResponse(format!(
            "null `code` in {response}"
        ))),
        Some(Value::String(code)) => Ok(Some(code.clone())),
        Some(Value::Number(code)) => Ok(Some(code.to_string())),
        Some(other) => Err(DeliveryError::MalformedResponse(format!(
            "unexpected `code` value {other}"
        ))),
    }
}

/// Accepts a response whose code is absent, empty or [`SUCCESS_CODE`].
pub(crate) fn check_response(response: &Value) -> Result<(), DeliveryError> {
    match response_code(response)? {
        None => Ok(()),
        Some(code) if code.is_empty() || code == SUCCESS_CODE => Ok(()),
        Some(code) => Err(DeliveryError::Rejected {
            code,
            response: response.to_string(),
        }),
    }
}
