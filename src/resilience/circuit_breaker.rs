//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: a single trial call is in flight
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//! Open → Half-Open: first call after the cooldown elapsed (trial)
//! Half-Open → Closed: trial succeeds
//! Half-Open → Open: trial fails (cooldown restarts)
//! ```
//!
//! # Concurrency
//! All state lives behind one mutex that is never held across an await.
//! Only one caller obtains the trial permit; every other caller is
//! rejected until the trial resolves.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// The breaker rejected a call without invoking it.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("circuit open, next trial in {retry_in:?}")]
pub struct BreakerOpen {
    /// Time left until a trial call is permitted (zero while a trial is in flight).
    pub retry_in: Duration,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Consecutive-failure circuit breaker with a cooldown.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::from_config(&CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(config.failure_threshold, Duration::from_secs(config.cooldown_secs))
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Ask permission for one call.
    pub fn try_acquire(&self) -> Result<Permit<'_>, BreakerOpen> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(Permit::new(self, false)),
            CircuitState::HalfOpen => Err(BreakerOpen {
                retry_in: Duration::ZERO,
            }),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(self.cooldown);
                if elapsed >= self.cooldown {
                    inner.state = CircuitState::HalfOpen;
                    metrics::record_breaker_transition(CircuitState::HalfOpen.as_str());
                    tracing::info!("Circuit breaker cooldown elapsed, permitting trial call");
                    Ok(Permit::new(self, true))
                } else {
                    Err(BreakerOpen {
                        retry_in: self.cooldown - elapsed,
                    })
                }
            }
        }
    }

    /// Run `op` behind the breaker.
    ///
    /// `is_failure` decides whether the outcome counts against the upstream.
    pub async fn call<T, F, Fut>(
        &self,
        op: F,
        is_failure: impl FnOnce(&T) -> bool,
    ) -> Result<T, BreakerOpen>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let permit = self.try_acquire()?;
        let outcome = op().await;
        permit.record(is_failure(&outcome));
        Ok(outcome)
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen if trial => {
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                metrics::record_breaker_transition(CircuitState::Closed.as_str());
                tracing::info!("Circuit breaker reset to closed");
            }
            // A call admitted before the circuit opened; the open period stands.
            _ => {}
        }
    }

    fn on_failure(&self, trial: bool) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.failure_threshold {
                    self.open(&mut inner);
                }
            }
            CircuitState::HalfOpen if trial => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                self.open(&mut inner);
            }
            _ => {}
        }
    }

    fn open(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        metrics::record_breaker_transition(CircuitState::Open.as_str());
        tracing::error!(
            cooldown_secs = self.cooldown.as_secs_f64(),
            consecutive_failures = inner.consecutive_failures,
            "Circuit breaker opened"
        );
    }

    fn abandon_trial(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            // opened_at is kept, so the next caller may trial straight away.
            inner.state = CircuitState::Open;
            tracing::debug!("Trial call abandoned, circuit stays open");
        }
    }
}

/// Permission for one call. Record the outcome with [`Permit::record`].
#[derive(Debug)]
#[must_use = "a permit must record the call outcome"]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    /// True when this permit is the half-open trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record(mut self, failed: bool) {
        self.settled = true;
        if failed {
            self.breaker.on_failure(self.trial);
        } else {
            self.breaker.on_success(self.trial);
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.abandon_trial();
        }
    }
}
