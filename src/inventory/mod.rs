//! Asset inventory domain.
//!
//! # Data Flow
//! ```text
//! upstream body (JSON)
//!     → wire.rs (key normalization, lenient field parsing)
//!     → asset.rs (AssetRecord, derived inactivity)
//!     → classifier.rs (inactive computers, oldest first)
//!
//! upstream untrusted:
//!     → fallback.rs (fixed substitute dataset)
//! ```
//!
//! # Design Decisions
//! - Records are immutable; derived fields are computed on read
//! - Case-insensitivity is a normalization step, never ad hoc comparisons
//! - Classification is pure and takes an explicit `now` for determinism

pub mod asset;
pub mod classifier;
pub mod fallback;
pub mod wire;

pub use asset::{AssetRecord, INACTIVITY_THRESHOLD_DAYS, NEVER_COMMUNICATED_DAYS};
pub use classifier::{select_inactive_computers, select_inactive_computers_at};
