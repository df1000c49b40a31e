//! Market snapshots from the order book, or synthetic ones when the book
//! is unavailable.

use exchange_client::{DepthBook, ExchangeClient, ExchangeError, ExchangeResult};
use execution_policy::MarketSnapshot;
use rand::Rng;
use serde::Serialize;

/// Levels requested from the depth endpoint.
pub const DEPTH_LIMIT: u32 = 15;

/// Levels per side counted towards liquidity.
pub const LIQUIDITY_LEVELS: usize = 5;

/// Combined top-of-book quantity that scores 1.0.
pub const LIQUIDITY_NORMALIZER: f64 = 100_000.0;

/// Volatility assumed for live snapshots.
pub const DEFAULT_VOL_1M: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    Weex,
    Fallback,
}

impl SnapshotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weex => "weex",
            Self::Fallback => "fallback",
        }
    }
}

/// Snapshot from a parsed order book.
pub fn snapshot_from_book(book: &DepthBook) -> ExchangeResult<MarketSnapshot> {
    let (Some(ask), Some(bid)) = (book.best_ask(), book.best_bid()) else {
        return Err(ExchangeError::InvalidResponse(
            "order book has an empty side".to_string(),
        ));
    };

    let liquidity = (book.top_quantity(LIQUIDITY_LEVELS) / LIQUIDITY_NORMALIZER).clamp(0.0, 1.0);

    Ok(MarketSnapshot {
        mid: (ask.price + bid.price) / 2.0,
        spread: ask.price - bid.price,
        vol_1m: DEFAULT_VOL_1M,
        liquidity_score: liquidity,
    })
}

/// Fetch the book for `symbol` and turn it into a snapshot.
pub async fn live_snapshot(client: &ExchangeClient, symbol: &str) -> ExchangeResult<MarketSnapshot> {
    let book = client.depth_book(symbol, DEPTH_LIMIT).await?;
    snapshot_from_book(&book)
}

/// A plausible random snapshot.
pub fn fallback_snapshot() -> MarketSnapshot {
    let mut rng = rand::thread_rng();
    MarketSnapshot {
        mid: 60_000.0 + rng.gen_range(-200.0..=200.0),
        spread: rng.gen_range(2.0..=15.0),
        vol_1m: rng.gen_range(0.0005..=0.006),
        liquidity_score: rng.gen_range(0.2..=0.9),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_client::PriceLevel;

    fn level(price: f64, quantity: f64) -> PriceLevel {
        PriceLevel { price, quantity }
    }

    #[test]
    fn test_snapshot_from_book() {
        let book = DepthBook {
            asks: vec![level(60_010.0, 10_000.0), level(60_011.0, 5_000.0)],
            bids: vec![level(60_000.0, 20_000.0)],
        };

        let snapshot = snapshot_from_book(&book).unwrap();
        assert_eq!(snapshot.mid, 60_005.0);
        assert_eq!(snapshot.spread, 10.0);
        assert_eq!(snapshot.vol_1m, DEFAULT_VOL_1M);
        assert!((snapshot.liquidity_score - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_liquidity_clamped() {
        let book = DepthBook {
            asks: vec![level(101.0, 90_000.0)],
            bids: vec![level(100.0, 90_000.0)],
        };
        assert_eq!(snapshot_from_book(&book).unwrap().liquidity_score, 1.0);
    }

    #[test]
    fn test_empty_side_rejected() {
        let book = DepthBook {
            asks: vec![],
            bids: vec![level(100.0, 1.0)],
        };
        assert!(matches!(
            snapshot_from_book(&book),
            Err(ExchangeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_fallback_ranges() {
        for _ in 0..50 {
            let s = fallback_snapshot();
            assert!((59_800.0..=60_200.0).contains(&s.mid));
            assert!((2.0..=15.0).contains(&s.spread));
            assert!((0.0005..=0.006).contains(&s.vol_1m));
            assert!((0.2..=0.9).contains(&s.liquidity_score));
        }
    }
}
