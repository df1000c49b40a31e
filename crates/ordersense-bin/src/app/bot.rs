//! The decision loop: snapshot, choose an execution style, place or
//! simulate an order, and audit both steps through the outbox.

use super::audit::{AiLogEntry, STAGE_DECISION, STAGE_ORDER};
use super::context::AppContext;
use super::market::{fallback_snapshot, live_snapshot, SnapshotSource};
use audit_log_outbox::now_ms;
use chrono::Utc;
use exchange_client::{extract_order_id, is_filled_status, FillEvent, PlaceOrderRequest};
use execution_policy::{choose_execution, ExecDecision, ExecStyle, MarketSnapshot, Side};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pause between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(3);

/// Size every decision is made for.
pub const TARGET_SIZE: f64 = 0.5;

const FILL_POLL_TIMEOUT: Duration = Duration::from_secs(20);
const FILL_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// WEEX `order_type` for an execution style.
pub fn order_type_code(style: ExecStyle) -> &'static str {
    match style {
        ExecStyle::PostOnlyLimit => "1",
        ExecStyle::AggressiveLimit => "3",
        ExecStyle::Slice => "0",
    }
}

/// WEEX `type`: open long for buys, open short for sells.
pub fn side_code(side: Side) -> &'static str {
    match side {
        Side::Buy => "1",
        Side::Sell => "2",
    }
}

fn side_for_second(epoch_secs: i64) -> Side {
    if epoch_secs % 2 == 0 {
        Side::Buy
    } else {
        Side::Sell
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Sent to the exchange. The id is whatever the response carried.
    Real(Option<String>),
    Simulated(i64),
}

impl Placement {
    fn order_id_value(&self) -> Value {
        match self {
            Self::Real(id) => json!(id),
            Self::Simulated(id) => json!(id),
        }
    }

    /// The id as a number, when it is one.
    pub fn numeric_id(&self) -> Option<i64> {
        match self {
            Self::Real(Some(id)) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
                id.parse().ok()
            }
            Self::Real(_) => None,
            Self::Simulated(id) => Some(*id),
        }
    }

    fn status(&self) -> &'static str {
        match self {
            Self::Real(_) => "placed(real)",
            Self::Simulated(_) => "placed(simulated)",
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub source: SnapshotSource,
    pub decision: ExecDecision,
    pub placement: Result<Placement, String>,
}

struct RunningBot {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Starts and stops the decision loop task.
#[derive(Default)]
pub struct BotController {
    running: Mutex<Option<RunningBot>>,
}

impl BotController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the loop. Returns false if it was already running.
    pub fn start(&self, ctx: &AppContext) -> bool {
        let mut slot = self.running.lock();
        if !ctx.state.mark_running() {
            return false;
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_loop(ctx.clone(), shutdown_rx));
        *slot = Some(RunningBot { shutdown, handle });

        ctx.state.add_event(json!({"type": "system", "msg": "Bot started"}));
        true
    }

    /// Signal the loop to stop after its current tick.
    pub fn stop(&self, ctx: &AppContext) {
        self.signal_stop(ctx);
    }

    /// Signal the loop and wait up to `timeout` for it to exit.
    pub async fn stop_and_wait(&self, ctx: &AppContext, timeout: Duration) -> bool {
        let Some(handle) = self.signal_stop(ctx) else {
            return true;
        };

        let abort = handle.abort_handle();
        match tokio::time::timeout(timeout, handle).await {
            Ok(_) => true,
            Err(_) => {
                abort.abort();
                warn!(timeout_ms = timeout.as_millis() as u64, "Bot loop did not stop in time, aborted");
                false
            }
        }
    }

    fn signal_stop(&self, ctx: &AppContext) -> Option<JoinHandle<()>> {
        let running = self.running.lock().take();
        ctx.state.mark_stopped();
        ctx.state.add_event(json!({"type": "system", "msg": "Bot stopped"}));

        let running = running?;
        let _ = running.shutdown.send(());
        Some(running.handle)
    }
}

async fn run_loop(ctx: AppContext, mut shutdown: oneshot::Receiver<()>) {
    info!(
        symbol = %ctx.config.symbol,
        dry_run = ctx.config.dry_run,
        "Bot loop started"
    );

    loop {
        tick(&ctx).await;

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(TICK_INTERVAL) => {}
        }
    }

    info!("Bot loop stopped");
}

/// Run one decision cycle.
pub async fn tick(ctx: &AppContext) -> TickReport {
    let symbol = ctx.state.symbol();

    let (snapshot, source) = match live_snapshot(&ctx.exchange, &symbol).await {
        Ok(snapshot) => (snapshot, SnapshotSource::Weex),
        Err(e) => {
            debug!(error = %e, "Depth unavailable, using fallback snapshot");
            ctx.state
                .add_event(json!({"type": "error", "msg": format!("depth_failed: {e}")}));
            (fallback_snapshot(), SnapshotSource::Fallback)
        }
    };

    let side = side_for_second(Utc::now().timestamp());
    let decision = choose_execution(&snapshot, side, TARGET_SIZE);
    record_decision(ctx, &symbol, side, &snapshot, source, &decision);

    let client_oid = format!("os_{}", now_ms());
    let placement = place(ctx, &symbol, side, &decision, source, &client_oid).await;

    match &placement {
        Ok(placement) => record_order(ctx, &decision, source, &client_oid, placement),
        Err(message) => {
            warn!(client_oid = %client_oid, error = %message, "Order placement failed");
            ctx.state.add_event(json!({
                "type": "error",
                "msg": format!("order_failed: {message}"),
                "client_oid": client_oid,
            }));
        }
    }

    TickReport {
        source,
        decision,
        placement,
    }
}

fn record_decision(
    ctx: &AppContext,
    symbol: &str,
    side: Side,
    snapshot: &MarketSnapshot,
    source: SnapshotSource,
    decision: &ExecDecision,
) {
    ctx.state.add_event(json!({
        "type": "decision",
        "symbol": symbol,
        "side": side.as_str(),
        "style": decision.style.as_str(),
        "price": decision.price,
        "size": decision.size,
        "reason": decision.reason,
        "snapshot": {
            "mid": snapshot.mid,
            "spread": snapshot.spread,
            "liq": snapshot.liquidity_score,
            "source": source.as_str(),
        },
    }));
    ctx.state.record_decision();

    audit(
        ctx,
        &AiLogEntry::new(
            STAGE_DECISION,
            &ctx.config.model_name,
            json!({
                "symbol": symbol,
                "side": side.as_str(),
                "target_size": TARGET_SIZE,
                "snapshot": snapshot,
                "source": source.as_str(),
            }),
            json!({ "execution": decision }),
            &decision.reason,
        ),
    );
}

async fn place(
    ctx: &AppContext,
    symbol: &str,
    side: Side,
    decision: &ExecDecision,
    source: SnapshotSource,
    client_oid: &str,
) -> Result<Placement, String> {
    if ctx.config.dry_run || source != SnapshotSource::Weex {
        return Ok(Placement::Simulated(now_ms() % 10_000_000));
    }

    let price = decision
        .price
        .ok_or_else(|| format!("no limit price for {} execution", decision.style.as_str()))?;

    let order = PlaceOrderRequest::limit(
        symbol,
        client_oid,
        ctx.config.order_size.as_str(),
        side_code(side),
        order_type_code(decision.style),
        format!("{price:.2}"),
    );

    let response = ctx
        .exchange
        .place_order(&order)
        .await
        .map_err(|e| e.to_string())?;
    let order_id = extract_order_id(&response);

    info!(client_oid, order_id = ?order_id, style = decision.style.as_str(), "Order placed");
    if let Some(order_id) = &order_id {
        spawn_fill_watch(ctx, order_id.clone());
    }
    Ok(Placement::Real(order_id))
}

fn record_order(
    ctx: &AppContext,
    decision: &ExecDecision,
    source: SnapshotSource,
    client_oid: &str,
    placement: &Placement,
) {
    let mut event = json!({
        "type": "order",
        "orderId": placement.order_id_value(),
        "status": placement.status(),
        "client_oid": client_oid,
    });
    if matches!(placement, Placement::Simulated(_)) {
        event["note"] = json!("DRY_RUN or fallback market data");
    }
    ctx.state.add_event(event);
    ctx.state.record_order();

    audit(
        ctx,
        &AiLogEntry::new(
            STAGE_ORDER,
            &ctx.config.model_name,
            json!({
                "requested": decision,
                "client_oid": client_oid,
                "dry_run": ctx.config.dry_run,
                "source": source.as_str(),
            }),
            json!({ "orderId": placement.order_id_value(), "status": "placed" }),
            "Order placement executed.",
        )
        .with_order_id(placement.numeric_id()),
    );
}

fn audit<T: Serialize>(ctx: &AppContext, entry: &T) {
    if let Err(e) = ctx.outbox.enqueue(entry) {
        error!(error = %e, "Failed to enqueue audit event");
        ctx.state
            .add_event(json!({"type": "error", "msg": format!("audit_enqueue_failed: {e}")}));
    }
}

fn spawn_fill_watch(ctx: &AppContext, order_id: String) {
    let exchange = Arc::clone(&ctx.exchange);
    let state = Arc::clone(&ctx.state);

    tokio::spawn(async move {
        match exchange
            .poll_until_filled(&order_id, FILL_POLL_TIMEOUT, FILL_POLL_INTERVAL)
            .await
        {
            Ok(Some(detail)) => {
                let fill = FillEvent::from_detail(&detail);
                if !fill.status.as_deref().is_some_and(is_filled_status) {
                    debug!(order_id = %order_id, status = ?fill.status, "Order not filled before poll timeout");
                    return;
                }
                match serde_json::to_value(&fill) {
                    Ok(event) => state.add_event(event),
                    Err(e) => warn!(order_id = %order_id, error = %e, "Could not serialize fill"),
                }
            }
            Ok(None) => debug!(order_id = %order_id, "No order detail returned"),
            Err(e) => state.add_event(json!({
                "type": "error",
                "msg": format!("fill_poll_failed: {e}"),
                "orderId": order_id,
            })),
        }
    });
}
