//! In-memory bot state shown on the dashboard.

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::VecDeque;

/// Events kept in memory; older ones are dropped.
pub const EVENT_CAPACITY: usize = 200;

/// Events returned by the events endpoint.
pub const EVENTS_PAGE: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub decisions: u64,
    pub orders: u64,
    pub maker_rate: f64,
    pub avg_slippage_bps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub running: bool,
    pub symbol: String,
    pub started_at: Option<f64>,
}

#[derive(Debug)]
struct Inner {
    running: bool,
    started_at: Option<f64>,
    symbol: String,
    events: VecDeque<Value>,
    metrics: Metrics,
}

/// Shared bot state. All methods take `&self`.
#[derive(Debug)]
pub struct StateStore {
    inner: Mutex<Inner>,
}

/// Wall clock in fractional seconds.
pub fn now_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

impl StateStore {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                running: false,
                started_at: None,
                symbol: symbol.into(),
                events: VecDeque::with_capacity(EVENT_CAPACITY),
                metrics: Metrics::default(),
            }),
        }
    }

    /// Flip to running. Returns false if the bot was already running.
    pub fn mark_running(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.running {
            return false;
        }
        inner.running = true;
        inner.started_at = Some(now_secs());
        true
    }

    /// Flip to stopped. Returns false if the bot was not running.
    pub fn mark_stopped(&self) -> bool {
        let mut inner = self.inner.lock();
        let was_running = inner.running;
        inner.running = false;
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    pub fn symbol(&self) -> String {
        self.inner.lock().symbol.clone()
    }

    pub fn status(&self) -> StatusView {
        let inner = self.inner.lock();
        StatusView {
            running: inner.running,
            symbol: inner.symbol.clone(),
            started_at: inner.started_at,
        }
    }

    /// Push an event onto the feed, newest first.
    ///
    /// Objects get a `ts` field if they lack one. Anything else is wrapped
    /// as `{"value": ..}`.
    pub fn add_event(&self, event: Value) {
        let mut event = match event {
            Value::Object(map) => Value::Object(map),
            other => json!({ "value": other }),
        };
        if let Some(map) = event.as_object_mut() {
            map.entry("ts").or_insert_with(|| json!(now_secs()));
        }

        let mut inner = self.inner.lock();
        inner.events.push_front(event);
        inner.events.truncate(EVENT_CAPACITY);
    }

    /// Up to `limit` events, newest first.
    pub fn events(&self, limit: usize) -> Vec<Value> {
        self.inner.lock().events.iter().take(limit).cloned().collect()
    }

    pub fn metrics(&self) -> Metrics {
        self.inner.lock().metrics.clone()
    }

    pub fn record_decision(&self) {
        self.inner.lock().metrics.decisions += 1;
    }

    pub fn record_order(&self) {
        self.inner.lock().metrics.orders += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_flags() {
        let state = StateStore::new("cmt_btcusdt");
        assert!(!state.is_running());
        assert!(state.status().started_at.is_none());

        assert!(state.mark_running());
        assert!(!state.mark_running());
        assert!(state.status().started_at.is_some());

        assert!(state.mark_stopped());
        assert!(!state.mark_stopped());
        assert!(!state.status().running);
    }

    #[test]
    fn test_events_newest_first_and_capped() {
        let state = StateStore::new("cmt_btcusdt");
        for i in 0..(EVENT_CAPACITY + 10) {
            state.add_event(json!({"type": "decision", "n": i}));
        }

        let events = state.events(usize::MAX);
        assert_eq!(events.len(), EVENT_CAPACITY);
        assert_eq!(events[0]["n"], EVENT_CAPACITY + 9);
        assert!(events[0]["ts"].is_f64());

        assert_eq!(state.events(EVENTS_PAGE).len(), EVENTS_PAGE);
    }

    #[test]
    fn test_event_keeps_existing_ts() {
        let state = StateStore::new("cmt_btcusdt");
        state.add_event(json!({"type": "fill", "ts": 1.5}));
        state.add_event(json!("bare"));

        let events = state.events(10);
        assert_eq!(events[0]["value"], "bare");
        assert_eq!(events[1]["ts"], 1.5);
    }

    #[test]
    fn test_metrics_counters() {
        let state = StateStore::new("cmt_btcusdt");
        state.record_decision();
        state.record_decision();
        state.record_order();

        let metrics = state.metrics();
        assert_eq!(metrics.decisions, 2);
        assert_eq!(metrics.orders, 1);
        assert_eq!(metrics.maker_rate, 0.0);
    }
}
