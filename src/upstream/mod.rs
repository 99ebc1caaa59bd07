//! Upstream inventory API integration.
//!
//! # Data Flow
//! ```text
//! caller
//!     → client.rs (breaker gate → retry loop → classification → decode)
//!     → transport.rs (authenticated HTTP GET)
//!     → types.rs (Fetched::Live | Fetched::Fallback { reason })
//! ```
//!
//! # Design Decisions
//! - Callers always get usable data; provenance is carried in the type
//! - No credentials means fallback-only, never a startup failure
//! - Never log credentials

pub mod client;
pub mod transport;
pub mod types;

pub use client::UpstreamClient;
pub use transport::{Endpoint, Outcome, ReqwestTransport, Transport, TransportError, UpstreamResponse};
pub use types::{FetchError, Fetched};
