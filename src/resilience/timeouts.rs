//! Per-attempt deadlines.
//!
//! Every upstream attempt runs under a deadline; an elapsed deadline is
//! reported as a transport timeout, which the retry policy treats as
//! transient.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::upstream::transport::{Outcome, TransportError};

/// Run one attempt, converting an elapsed deadline into `TransportError::Timeout`.
pub async fn with_deadline<F>(deadline: Duration, attempt: F) -> Outcome
where
    F: Future<Output = Outcome>,
{
    match timeout(deadline, attempt).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(deadline_secs = deadline.as_secs_f64(), "Upstream attempt timed out");
            Err(TransportError::Timeout(deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::transport::UpstreamResponse;
    use reqwest::StatusCode;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let outcome = with_deadline(Duration::from_secs(30), async {
            tokio::time::sleep(Duration::from_secs(31)).await;
            Ok(UpstreamResponse::new(StatusCode::OK, "late"))
        })
        .await;
        assert_eq!(outcome, Err(TransportError::Timeout(Duration::from_secs(30))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_attempt_passes_through() {
        let outcome = with_deadline(Duration::from_secs(30), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(UpstreamResponse::new(StatusCode::OK, "ok"))
        })
        .await;
        assert_eq!(outcome.unwrap().body, "ok");
    }
}
