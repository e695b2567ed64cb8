//! Timing for the two pipeline phases
//!
//! Pure helpers that can be tested without a transport.

use serde::Serialize;
use std::time::{Duration, Instant};

/// How long each phase of a fetch took
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTiming {
    /// Time spent sending batch requests
    pub fetch_ms: u64,
    /// Time spent splitting and decoding responses
    pub format_ms: u64,
}

/// Milliseconds since `start`, saturating at `u64::MAX`
pub fn elapsed_ms(start: Instant) -> u64 {
    duration_ms(start.elapsed())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
