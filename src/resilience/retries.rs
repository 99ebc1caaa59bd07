//! Retry logic.
//!
//! # Responsibilities
//! - Classify an attempt outcome as retryable or final
//! - Re-run retryable attempts with exponential backoff
//! - Hand back the last outcome unchanged once retries run out
//!
//! # Design Decisions
//! - Transport failures are always retryable; statuses only when listed
//!   in the configured transient set
//! - No distinct "exhausted" error; callers see the final real outcome
//! - Waiting is `tokio::time::sleep`, so only the calling task is parked

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::upstream::transport::Outcome;

/// Bounded retry policy for a single upstream call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base: u32,
    backoff_unit: Duration,
    jitter_ratio: f64,
    transient_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        let transient_statuses = config
            .transient_statuses
            .iter()
            .filter_map(|code| StatusCode::from_u16(*code).ok())
            .collect();

        Self {
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
            backoff_unit: Duration::from_millis(config.backoff_unit_ms),
            jitter_ratio: config.jitter_ratio,
            transient_statuses,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_transient_status(&self, status: StatusCode) -> bool {
        self.transient_statuses.contains(&status)
    }

    /// Reason to retry `outcome`, or `None` if it is final.
    pub fn retry_reason(&self, outcome: &Outcome) -> Option<String> {
        match outcome {
            Err(e) => Some(e.to_string()),
            Ok(response) if self.is_transient_status(response.status) => {
                Some(format!("status {}", response.status))
            }
            Ok(_) => None,
        }
    }

    pub fn is_retryable(&self, outcome: &Outcome) -> bool {
        self.retry_reason(outcome).is_some()
    }

    /// Delay applied before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.backoff_base, self.backoff_unit, self.jitter_ratio)
    }

    /// Run `op`, retrying retryable outcomes up to `max_retries` times.
    pub async fn execute<F, Fut>(&self, mut op: F) -> Outcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let mut retry = 0;
        loop {
            let outcome = op().await;

            let Some(reason) = self.retry_reason(&outcome) else {
                return outcome;
            };

            if retry >= self.max_retries {
                tracing::warn!(
                    attempts = retry + 1,
                    reason = %reason,
                    "Retries exhausted, returning last outcome"
                );
                return outcome;
            }

            retry += 1;
            let delay = self.delay_for(retry);
            tracing::warn!(
                attempt = retry,
                delay_secs = delay.as_secs_f64(),
                reason = %reason,
                "Retrying upstream call"
            );
            metrics::record_retry();
            tokio::time::sleep(delay).await;
        }
    }
}
