//! Retry schedule.

/// Ceiling on the delay between attempts.
pub const MAX_BACKOFF_SECS: u64 = 60;

/// Exponent stops growing here; 2^6 already exceeds the ceiling.
const MAX_EXPONENT: u32 = 6;

/// Delay before the next attempt of an event that has failed `tries` times.
///
/// `min(60, 2^min(tries, 6))`: 1→2s, 2→4s, 3→8s, 4→16s, 5→32s, then 60s.
pub fn backoff_seconds(tries: u32) -> u64 {
    let exponent = tries.min(MAX_EXPONENT);
    (1u64 << exponent).min(MAX_BACKOFF_SECS)
}

/// Absolute time of the next attempt.
pub fn next_try_at_ms(now_ms: i64, tries: u32) -> i64 {
    let delay_ms = i64::try_from(backoff_seconds(tries) * 1_000).unwrap_or(i64::MAX);
    now_ms.saturating_add(delay_ms)
}

/// Wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
