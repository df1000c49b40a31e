use crate::app::{AppContext, Metrics, EVENTS_PAGE};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn status(State(ctx): State<AppContext>) -> Json<Value> {
    let status = ctx.state.status();
    let pending = match ctx.outbox.pending_count() {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "Could not count pending audit events");
            None
        }
    };

    Json(json!({
        "running": status.running,
        "symbol": status.symbol,
        "started_at": status.started_at,
        "dry_run": ctx.config.dry_run,
        "pending_audit_events": pending,
    }))
}

pub async fn metrics(State(ctx): State<AppContext>) -> Json<Metrics> {
    Json(ctx.state.metrics())
}

pub async fn events(State(ctx): State<AppContext>) -> Json<Vec<Value>> {
    Json(ctx.state.events(EVENTS_PAGE))
}

pub async fn start(State(ctx): State<AppContext>) -> Json<Value> {
    ctx.bot.start(&ctx);
    Json(json!({ "running": true }))
}

pub async fn stop(State(ctx): State<AppContext>) -> Json<Value> {
    ctx.bot.stop(&ctx);
    Json(json!({ "running": false }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
