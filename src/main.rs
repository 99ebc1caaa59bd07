//! Asset inventory CLI.
//!
//! Queries the inventory API through the resilient client and prints
//! JSON on stdout. Logs go to stderr.
//!
//! ```text
//! asset-inventory [--config inventory.toml] assets
//! asset-inventory [--config inventory.toml] inactive
//! asset-inventory [--config inventory.toml] asset <id>
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use asset_inventory::config::load_config;
use asset_inventory::inventory::NEVER_COMMUNICATED_DAYS;
use asset_inventory::observability::logging::init_logging;
use asset_inventory::{AssetRecord, Fetched, UpstreamClient};

#[derive(Parser)]
#[command(name = "asset-inventory")]
#[command(about = "Query the asset inventory API with retries, circuit breaking and fallback", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults plus INVENTORY_* environment otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all assets
    Assets,
    /// List computers silent for more than 60 days, longest first
    Inactive,
    /// Show a single asset
    Asset {
        /// Upstream asset id
        id: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetView<'a> {
    #[serde(flatten)]
    record: &'a AssetRecord,
    days_since_last_communication: Option<i64>,
    is_inactive: bool,
}

impl<'a> From<&'a AssetRecord> for AssetView<'a> {
    fn from(record: &'a AssetRecord) -> Self {
        let days = record.days_since_last_communication();
        Self {
            record,
            days_since_last_communication: (days != NEVER_COMMUNICATED_DAYS).then_some(days),
            is_inactive: record.is_inactive(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<T: Serialize> {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    data: T,
}

impl<T: Serialize> Report<T> {
    fn new<U>(fetched: &Fetched<U>, data: T) -> Self {
        Self {
            source: fetched.source(),
            fallback_reason: fetched.fallback_reason().map(ToString::to_string),
            data,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(
        base_url = %config.upstream.base_url,
        max_retries = config.retries.max_retries,
        failure_threshold = config.circuit_breaker.failure_threshold,
        cooldown_secs = config.circuit_breaker.cooldown_secs,
        "Configuration loaded"
    );

    let client = UpstreamClient::from_config(&config)?;

    match cli.command {
        Commands::Assets => {
            let fetched = client.fetch_all().await;
            let views: Vec<AssetView> = fetched.data().iter().map(AssetView::from).collect();
            print_json(&Report::new(&fetched, views))?;
        }
        Commands::Inactive => {
            let fetched = client.fetch_inactive_computers().await;
            let views: Vec<AssetView> = fetched.data().iter().map(AssetView::from).collect();
            print_json(&Report::new(&fetched, views))?;
        }
        Commands::Asset { id } => {
            let fetched = client.fetch_by_id(&id).await;
            let view = fetched.data().as_ref().map(AssetView::from);
            let found = view.is_some();
            print_json(&Report::new(&fetched, view))?;
            if !found {
                eprintln!("Asset '{}' not found", id);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
