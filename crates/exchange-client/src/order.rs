//! Order placement request.

use serde::Serialize;
use serde_json::Value;

/// Longest `client_oid` the exchange accepts.
pub const MAX_CLIENT_OID_CHARS: usize = 40;

/// Body of `POST /capi/v2/order/placeOrder`.
///
/// `kind` is the exchange's `type`: 1 open long, 2 open short, 3 close
/// long, 4 close short. `order_type`: 0 normal, 1 post-only, 2 FOK,
/// 3 IOC. `match_price`: 0 limit, 1 market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceOrderRequest {
    pub symbol: String,
    pub client_oid: String,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub order_type: String,
    pub match_price: String,
    pub price: String,
    #[serde(rename = "presetTakeProfitPrice", skip_serializing_if = "Option::is_none")]
    pub preset_take_profit_price: Option<String>,
    #[serde(rename = "presetStopLossPrice", skip_serializing_if = "Option::is_none")]
    pub preset_stop_loss_price: Option<String>,
    #[serde(rename = "marginMode", skip_serializing_if = "Option::is_none")]
    pub margin_mode: Option<i32>,
}

impl PlaceOrderRequest {
    /// A limit order with no presets.
    pub fn limit(
        symbol: impl Into<String>,
        client_oid: impl Into<String>,
        size: impl Into<String>,
        kind: impl Into<String>,
        order_type: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            client_oid: client_oid.into(),
            size: size.into(),
            kind: kind.into(),
            order_type: order_type.into(),
            match_price: "0".to_string(),
            price: price.into(),
            preset_take_profit_price: None,
            preset_stop_loss_price: None,
            margin_mode: None,
        }
    }

    /// Copy with `client_oid` cut to [`MAX_CLIENT_OID_CHARS`].
    pub(crate) fn normalized(&self) -> Self {
        let mut order = self.clone();
        order.client_oid = order.client_oid.chars().take(MAX_CLIENT_OID_CHARS).collect();
        order
    }
}

/// Order id from a place-order or detail response.
///
/// Looks under `data` first, then at the top level, for `order_id` or
/// `orderId` given as a string or a number.
pub fn extract_order_id(response: &Value) -> Option<String> {
    let data = response.get("data").filter(|d| d.is_object()).unwrap_or(response);
    ["order_id", "orderId"]
        .iter()
        .filter_map(|key| data.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
