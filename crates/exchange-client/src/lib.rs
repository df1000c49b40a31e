//! Signed REST client for the WEEX contract API.
//!
//! Every request carries `ACCESS-KEY`, `ACCESS-SIGN`, `ACCESS-PASSPHRASE`
//! and `ACCESS-TIMESTAMP` headers. The signature is
//! `base64(HMAC-SHA256(secret, timestamp + METHOD + path + query + body))`.

mod client;
mod depth;
mod error;
mod order;
mod order_status;
mod signing;

pub use client::{
    AiLogUpload, Credentials, ExchangeClient, DEFAULT_TIMEOUT, DEPTH_TIMEOUT,
    MAX_AI_LOG_EXPLANATION_CHARS,
};
pub use depth::{DepthBook, PriceLevel};
pub use error::{ExchangeError, ExchangeResult};
pub use order::{extract_order_id, PlaceOrderRequest, MAX_CLIENT_OID_CHARS};
pub use order_status::{is_filled_status, FillEvent, FILLED_STATUSES};
pub use signing::{build_query, sign};
