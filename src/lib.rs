//! Resilient asset inventory client library.

pub mod config;
pub mod inventory;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::InventoryConfig;
pub use inventory::{select_inactive_computers, AssetRecord};
pub use upstream::{FetchError, Fetched, UpstreamClient};
