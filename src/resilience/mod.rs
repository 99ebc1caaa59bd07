//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → circuit_breaker.rs (gate: reject fast while open, single trial after cooldown)
//!     → retries.rs (retry transient outcomes with backoff.rs delays)
//!     → timeouts.rs (per-attempt deadline)
//!     → transport
//! ```
//!
//! # Design Decisions
//! - The breaker gates the whole call; retries run inside a permitted call
//! - Only the final post-retry outcome counts toward the breaker threshold
//! - Every attempt has a deadline
//! - Breaker state is owned per client, never global

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerOpen, CircuitBreaker, CircuitState, Permit};
pub use retries::RetryPolicy;
