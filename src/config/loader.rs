//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::InventoryConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file settings.
pub const ENV_BASE_URL: &str = "INVENTORY_BASE_URL";
pub const ENV_USERNAME: &str = "INVENTORY_USERNAME";
pub const ENV_PASSWORD: &str = "INVENTORY_PASSWORD";
pub const ENV_ENTERPRISE: &str = "INVENTORY_ENTERPRISE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process
/// environment overrides, and validate.
pub fn load_config(path: Option<&Path>) -> Result<InventoryConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<InventoryConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => InventoryConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay non-empty environment values onto `config`.
pub fn apply_env_overrides<F>(config: &mut InventoryConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = get(ENV_BASE_URL) {
        config.upstream.base_url = base_url;
    }
    if let Some(username) = get(ENV_USERNAME) {
        config.upstream.username = Some(username);
    }
    if let Some(password) = get(ENV_PASSWORD) {
        config.upstream.password = Some(password);
    }
    if let Some(enterprise) = get(ENV_ENTERPRISE) {
        config.upstream.enterprise = Some(enterprise);
    }
}
