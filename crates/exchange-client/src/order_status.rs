//! Order detail lookups and fill polling.

use crate::client::ORDER_DETAIL_PATH;
use crate::{extract_order_id, ExchangeClient, ExchangeResult, DEFAULT_TIMEOUT};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Status strings that mean an order is completely filled.
pub const FILLED_STATUSES: [&str; 3] = ["filled", "full_fill", "complete"];

pub fn is_filled_status(status: &str) -> bool {
    let status = status.to_ascii_lowercase();
    FILLED_STATUSES.contains(&status.as_str())
}

impl ExchangeClient {
    /// `GET /capi/v2/order/detail`.
    pub async fn order_detail(&self, order_id: &str) -> ExchangeResult<Value> {
        let params = [("orderId", order_id.to_string())];
        self.request(Method::GET, ORDER_DETAIL_PATH, &params, None, DEFAULT_TIMEOUT)
            .await
    }

    /// Poll the order until it is filled or `timeout` passes.
    ///
    /// Returns the filled detail, or the last detail seen when the order
    /// never filled, or `None` if no detail object came back.
    pub async fn poll_until_filled(
        &self,
        order_id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> ExchangeResult<Option<Value>> {
        let deadline = Instant::now() + timeout;
        let mut last = None;

        while Instant::now() < deadline {
            let response = self.order_detail(order_id).await?;
            let detail = detail_object(response);

            if let Some(detail) = &detail {
                let status = status_of(detail);
                debug!(order_id, status = %status, "Polled order status");
                if is_filled_status(&status) {
                    return Ok(Some(detail.clone()));
                }
            }

            last = detail;
            tokio::time::sleep(interval).await;
        }

        Ok(last)
    }
}

fn detail_object(response: Value) -> Option<Value> {
    let data = match response {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };
    data.is_object().then_some(data)
}

fn status_of(detail: &Value) -> String {
    text_field(detail, "status").unwrap_or_default()
}

fn text_field(detail: &Value, key: &str) -> Option<String> {
    match detail.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A fill, in the shape pushed onto the event feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub order_id: Option<String>,
    pub client_oid: Option<String>,
    pub symbol: Option<String>,
    pub status: Option<String>,
    /// open_long, open_short, close_long or close_short
    pub side: Option<String>,
    pub filled_qty: Option<String>,
    pub avg_price: Option<String>,
    pub fee: Option<String>,
}

impl FillEvent {
    pub fn from_detail(detail: &Value) -> Self {
        Self {
            kind: "fill",
            order_id: extract_order_id(detail),
            client_oid: text_field(detail, "client_oid"),
            symbol: text_field(detail, "symbol"),
            status: text_field(detail, "status"),
            side: text_field(detail, "type"),
            filled_qty: text_field(detail, "filled_qty"),
            avg_price: text_field(detail, "price_avg"),
            fee: text_field(detail, "fee"),
        }
    }
}
