//! Metrics collection.
//!
//! # Metrics
//! - `inventory_upstream_retries_total` (counter): retried attempts
//! - `inventory_breaker_transitions_total` (counter): by target state
//! - `inventory_fetch_total` (counter): by endpoint and source (live/fallback)

/// Record one retried upstream attempt.
pub fn record_retry() {
    metrics::counter!("inventory_upstream_retries_total").increment(1);
}

/// Record a circuit breaker state change.
pub fn record_breaker_transition(state: &'static str) {
    metrics::counter!("inventory_breaker_transitions_total", "state" => state).increment(1);
}

/// Record a completed fetch and where its data came from.
pub fn record_fetch(endpoint: &'static str, source: &'static str) {
    metrics::counter!(
        "inventory_fetch_total",
        "endpoint" => endpoint,
        "source" => source
    )
    .increment(1);
}
