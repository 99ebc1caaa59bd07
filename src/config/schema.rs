//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! inventory client. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

use crate::upstream::transport::BasicCredentials;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InventoryConfig {
    /// Upstream inventory API settings.
    pub upstream: UpstreamConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Upstream inventory API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the inventory API.
    pub base_url: String,

    /// Basic auth username.
    pub username: Option<String>,

    /// Basic auth password.
    pub password: Option<String>,

    /// Enterprise tag (opaque, carried in log context).
    pub enterprise: Option<String>,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,

    /// Honor HTTP(S)_PROXY environment variables.
    pub respect_proxy_env: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.magma-3.com/v2/Force1/".to_string(),
            username: None,
            password: None,
            enterprise: None,
            timeout_secs: 30,
            respect_proxy_env: true,
        }
    }
}

impl UpstreamConfig {
    /// Basic credentials, if both username and password are present.
    pub fn credentials(&self) -> Option<BasicCredentials> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some(BasicCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("enterprise", &self.enterprise)
            .field("timeout_secs", &self.timeout_secs)
            .field("respect_proxy_env", &self.respect_proxy_env)
            .finish()
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Exponential base; retry n waits `backoff_unit_ms * backoff_base^n`.
    pub backoff_base: u32,

    /// Backoff unit in milliseconds.
    pub backoff_unit_ms: u64,

    /// Extra random delay as a fraction of the computed delay (0.0 to 1.0).
    pub jitter_ratio: f64,

    /// HTTP statuses treated as transient.
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: 2,
            backoff_unit_ms: 1000,
            jitter_ratio: 0.0,
            transient_statuses: vec![408, 503, 504],
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed calls that open the circuit.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a trial call.
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
