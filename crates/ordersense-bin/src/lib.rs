//! OrderSense service: decision bot, HTTP dashboard API and durable audit
//! logging of every decision and order.

pub mod app;
pub mod http;
