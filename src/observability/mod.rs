//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resilience and upstream code produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//!
//! Consumers:
//!     → stdout/stderr (pretty or JSON)
//!     → whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, never preformatted strings
//! - Each fetch runs in a span carrying a fetch ID
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
