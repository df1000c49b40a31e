//! Execution-style selection.
//!
//! Given a market snapshot, a side and a target size, decide whether to
//! rest a post-only order, cross the spread with an aggressive limit, or
//! slice the order.

use serde::{Deserialize, Serialize};

/// Relative spread under which the book counts as tight.
pub const TIGHT_SPREAD_RATIO: f64 = 0.0005;

/// One-minute volatility under which the market counts as calm.
pub const CALM_VOLATILITY: f64 = 0.002;

/// Sizes above this, in thin books, are sliced.
pub const LARGE_SIZE: f64 = 1.0;

/// Liquidity score under which a book is thin.
pub const THIN_LIQUIDITY: f64 = 0.5;

/// Fraction of the spread a post-only order sits inside the mid.
const PASSIVE_OFFSET: f64 = 0.25;

/// Fraction of the spread an aggressive order reaches past the mid.
const AGGRESSIVE_OFFSET: f64 = 0.49;

/// Point-in-time view of the market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub mid: f64,
    pub spread: f64,
    pub vol_1m: f64,
    /// 0.0 (empty book) to 1.0 (deep book).
    pub liquidity_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStyle {
    PostOnlyLimit,
    AggressiveLimit,
    Slice,
}

impl ExecStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostOnlyLimit => "post_only_limit",
            Self::AggressiveLimit => "aggressive_limit",
            Self::Slice => "slice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecDecision {
    pub style: ExecStyle,
    /// Limit price; `None` for slicing.
    pub price: Option<f64>,
    pub size: f64,
    pub reason: String,
}

/// Choose how to execute `target_size` on `side`.
pub fn choose_execution(snapshot: &MarketSnapshot, side: Side, target_size: f64) -> ExecDecision {
    let tight_spread = snapshot.spread / snapshot.mid.max(1e-9) < TIGHT_SPREAD_RATIO;
    let calm = snapshot.vol_1m < CALM_VOLATILITY;
    let big = target_size > LARGE_SIZE && snapshot.liquidity_score < THIN_LIQUIDITY;

    if big {
        return ExecDecision {
            style: ExecStyle::Slice,
            price: None,
            size: target_size,
            reason: "Large size vs liquidity: slicing to reduce impact".to_string(),
        };
    }

    if tight_spread && calm {
        let offset = snapshot.spread * PASSIVE_OFFSET;
        let price = match side {
            Side::Buy => snapshot.mid - offset,
            Side::Sell => snapshot.mid + offset,
        };
        return ExecDecision {
            style: ExecStyle::PostOnlyLimit,
            price: Some(price),
            size: target_size,
            reason: "Tight spread + calm: post-only to capture maker".to_string(),
        };
    }

    let offset = snapshot.spread * AGGRESSIVE_OFFSET;
    let price = match side {
        Side::Buy => snapshot.mid + offset,
        Side::Sell => snapshot.mid - offset,
    };
    ExecDecision {
        style: ExecStyle::AggressiveLimit,
        price: Some(price),
        size: target_size,
        reason: "Volatile or wide spread: prioritize fill with aggressive limit".to_string(),
    }
}
