//! WEEX REST client.

use crate::signing::{build_query, sign};
use crate::{DepthBook, ExchangeError, ExchangeResult, PlaceOrderRequest};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Timeout for most requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Depth requests are on the decision hot path and fail fast.
pub const DEPTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Longest explanation the AI log endpoint accepts, in characters.
pub const MAX_AI_LOG_EXPLANATION_CHARS: usize = 1000;

/// Longest response body kept in a [`ExchangeError::NonJson`].
const MAX_ERROR_BODY_CHARS: usize = 500;

const UPLOAD_AI_LOG_PATH: &str = "/capi/v2/order/uploadAiLog";
const DEPTH_PATH: &str = "/capi/v2/market/depth";
const PLACE_ORDER_PATH: &str = "/capi/v2/order/placeOrder";
pub(crate) const ORDER_DETAIL_PATH: &str = "/capi/v2/order/detail";

/// API credentials.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Body of an AI log upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiLogUpload {
    #[serde(rename = "orderId")]
    pub order_id: Option<i64>,
    pub stage: String,
    pub model: String,
    pub input: Value,
    pub output: Value,
    pub explanation: String,
}

/// Signed client for the WEEX contract REST API.
#[derive(Clone, Debug)]
pub struct ExchangeClient {
    http_client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl ExchangeClient {
    /// Create a client for `base_url` (e.g. `https://api-contract.weex.com`).
    pub fn new(credentials: Credentials, base_url: &str) -> ExchangeResult<Self> {
        let parsed = Url::parse(base_url)?;
        let http_client = reqwest::Client::builder().build()?;

        Ok(Self {
            http_client,
            credentials,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one signed request and return the JSON body.
    ///
    /// POST requests always carry a JSON body (`{}` if none is given).
    /// Fails on a non-JSON body or a status of 400 and above.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
        timeout: Duration,
    ) -> ExchangeResult<Value> {
        let query = build_query(params);
        let body_text = if method == Method::POST {
            match body {
                Some(value) => serde_json::to_string(value)?,
                None => "{}".to_string(),
            }
        } else {
            String::new()
        };

        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let signature = sign(
            &self.credentials.secret_key,
            &timestamp,
            method.as_str(),
            path,
            &query,
            &body_text,
        )?;

        let url = format!("{}{}{}", self.base_url, path, query);
        debug!(method = %method, path, "Sending exchange request");

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .timeout(timeout)
            .header("ACCESS-KEY", &self.credentials.api_key)
            .header("ACCESS-SIGN", signature)
            .header("ACCESS-PASSPHRASE", &self.credentials.passphrase)
            .header("ACCESS-TIMESTAMP", &timestamp)
            .header("Content-Type", "application/json")
            .header("locale", "en-US");
        if method == Method::POST {
            request = request.body(body_text);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let payload: Value = serde_json::from_str(&text).map_err(|_| ExchangeError::NonJson {
            status,
            body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })?;

        if status >= 400 {
            return Err(ExchangeError::Api { status, payload });
        }

        Ok(payload)
    }

    /// Upload one AI decision log. The explanation is cut to 1000 chars.
    pub async fn upload_ai_log(&self, log: &AiLogUpload, timeout: Duration) -> ExchangeResult<Value> {
        let mut log = log.clone();
        if log.explanation.chars().count() > MAX_AI_LOG_EXPLANATION_CHARS {
            log.explanation = log
                .explanation
                .chars()
                .take(MAX_AI_LOG_EXPLANATION_CHARS)
                .collect();
        }
        let body = serde_json::to_value(&log)?;
        self.request(Method::POST, UPLOAD_AI_LOG_PATH, &[], Some(&body), timeout)
            .await
    }

    /// Raw order book response.
    pub async fn get_depth(&self, symbol: &str, limit: u32) -> ExchangeResult<Value> {
        let params = [("symbol", symbol.to_string()), ("limit", limit.to_string())];
        self.request(Method::GET, DEPTH_PATH, &params, None, DEPTH_TIMEOUT)
            .await
    }

    /// Order book parsed into price levels.
    pub async fn depth_book(&self, symbol: &str, limit: u32) -> ExchangeResult<DepthBook> {
        let response = self.get_depth(symbol, limit).await?;
        DepthBook::from_response(&response)
    }

    /// Place an order. `client_oid` is cut to 40 chars.
    pub async fn place_order(&self, order: &PlaceOrderRequest) -> ExchangeResult<Value> {
        let body = serde_json::to_value(order.normalized())?;
        self.request(Method::POST, PLACE_ORDER_PATH, &[], Some(&body), DEFAULT_TIMEOUT)
            .await
    }
}
