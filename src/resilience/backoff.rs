//! Exponential backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before retry number `retry` (1-based): `unit * base^retry`.
///
/// Jitter adds a random 0 to `jitter_ratio` fraction of the delay on top.
/// Retry 0 (the first attempt) never waits.
pub fn calculate_backoff(retry: u32, base: u32, unit: Duration, jitter_ratio: f64) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let factor = base.saturating_pow(retry);
    let delay = unit.saturating_mul(factor);

    if jitter_ratio <= 0.0 {
        return delay;
    }
    let jitter = rand::thread_rng().gen_range(0.0..=jitter_ratio.min(1.0));
    delay.saturating_add(delay.mul_f64(jitter))
}
