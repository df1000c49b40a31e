//! Error types for the exchange client.

use thiserror::Error;

/// Errors returned by [`crate::ExchangeClient`].
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// HTTP request failed before a response was read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not JSON
    #[error("Non-JSON response (status={status}): {body}")]
    NonJson { status: u16, body: String },

    /// Exchange answered with status >= 400
    #[error("WEEX HTTP {status}: {payload}")]
    Api {
        status: u16,
        payload: serde_json::Value,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Signing failed: {0}")]
    Signing(String),

    /// Response was JSON but missing expected fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias using ExchangeError.
pub type ExchangeResult<T> = Result<T, ExchangeError>;
