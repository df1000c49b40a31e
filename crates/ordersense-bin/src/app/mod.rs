//! Application wiring: shared state, the decision bot and the audit hookup.

mod audit;
mod bot;
mod context;
mod init;
mod market;
mod state;

pub use audit::{AiLogEntry, ExchangeAuditUploader, STAGE_DECISION, STAGE_ORDER};
pub use bot::{order_type_code, side_code, tick, BotController, Placement, TickReport, TICK_INTERVAL};
pub use context::{outbox_config, AppContext};
pub use init::{run_service, shutdown, RunOptions};
pub use market::{fallback_snapshot, snapshot_from_book, SnapshotSource};
pub use state::{Metrics, StateStore, StatusView, EVENTS_PAGE, EVENT_CAPACITY};
