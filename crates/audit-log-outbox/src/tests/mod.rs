//! Scenario tests for the audit outbox.
//!
//! - `harness.rs`    - Mock uploader and a temp-file backed outbox
//! - `delivery.rs`   - Single flushes: success, rejection, malformed input, timeouts
//! - `lifecycle.rs`  - start/stop behavior and wake-ups
//! - `durability.rs` - Rows surviving restarts
//! - `concurrency.rs` - Many producers, batch ordering
//! - `storage.rs`    - Store failures seen by producers and the worker

mod delivery;
pub(crate) mod harness;
