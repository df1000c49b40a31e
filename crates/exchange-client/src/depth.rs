//! Order book parsing.

use crate::{ExchangeError, ExchangeResult};
use serde_json::Value;

/// One price level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Asks ascending, bids descending, as the exchange returns them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthBook {
    pub asks: Vec<PriceLevel>,
    pub bids: Vec<PriceLevel>,
}

impl DepthBook {
    /// Parse a depth response. Accepts the book at the top level or under
    /// `data`. Levels are `[price, qty]` pairs of strings or numbers.
    pub fn from_response(response: &Value) -> ExchangeResult<Self> {
        let data = response.get("data").filter(|d| d.is_object()).unwrap_or(response);

        Ok(Self {
            asks: parse_side(data, "asks")?,
            bids: parse_side(data, "bids")?,
        })
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() || self.bids.is_empty()
    }

    /// Total quantity over the first `levels` asks and bids.
    pub fn top_quantity(&self, levels: usize) -> f64 {
        self.asks
            .iter()
            .take(levels)
            .chain(self.bids.iter().take(levels))
            .map(|level| level.quantity)
            .sum()
    }
}

fn parse_side(data: &Value, side: &str) -> ExchangeResult<Vec<PriceLevel>> {
    let Some(levels) = data.get(side) else {
        return Ok(Vec::new());
    };
    let levels = levels
        .as_array()
        .ok_or_else(|| ExchangeError::InvalidResponse(format!("`{side}` is not an array")))?;

    levels
        .iter()
        .map(|level| {
            let price = level.get(0).and_then(as_f64);
            let quantity = level.get(1).and_then(as_f64);
            match (price, quantity) {
                (Some(price), Some(quantity)) => Ok(PriceLevel { price, quantity }),
                _ => Err(ExchangeError::InvalidResponse(format!(
                    "bad `{side}` level: {level}"
                ))),
            }
        })
        .collect()
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
