//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, statuses in range)
//! - Reject half-specified credentials
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: InventoryConfig → Result<(), Vec<ValidationError>>
//! - Missing credentials are valid (fallback-only mode)

use thiserror::Error;
use url::Url;

use crate::config::schema::InventoryConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &InventoryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let upstream = &config.upstream;
    match Url::parse(upstream.base_url.trim()) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than 0"));
    }
    let has_username = upstream.username.as_deref().is_some_and(|u| !u.is_empty());
    let has_password = upstream.password.as_deref().is_some_and(|p| !p.is_empty());
    if has_username != has_password {
        errors.push(ValidationError::new(
            "upstream.username",
            "username and password must be set together",
        ));
    }

    let retries = &config.retries;
    if retries.backoff_base < 1 {
        errors.push(ValidationError::new("retries.backoff_base", "must be at least 1"));
    }
    if !(0.0..=1.0).contains(&retries.jitter_ratio) {
        errors.push(ValidationError::new("retries.jitter_ratio", "must be between 0.0 and 1.0"));
    }
    for status in &retries.transient_statuses {
        if !(100..=599).contains(status) {
            errors.push(ValidationError::new(
                "retries.transient_statuses",
                format!("{} is not an HTTP status", status),
            ));
        }
    }

    let breaker = &config.circuit_breaker;
    if breaker.failure_threshold == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_threshold",
            "must be greater than 0",
        ));
    }
    if breaker.cooldown_secs == 0 {
        errors.push(ValidationError::new("circuit_breaker.cooldown_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&InventoryConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = InventoryConfig::default();
        config.upstream.base_url = "ftp://example.com".into();
        config.upstream.timeout_secs = 0;
        config.retries.jitter_ratio = 1.5;
        config.retries.transient_statuses = vec![503, 42];
        config.circuit_breaker.failure_threshold = 0;
        config.circuit_breaker.cooldown_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "upstream.base_url",
                "upstream.timeout_secs",
                "retries.jitter_ratio",
                "retries.transient_statuses",
                "circuit_breaker.failure_threshold",
                "circuit_breaker.cooldown_secs",
            ]
        );
    }

    #[test]
    fn test_unparseable_url() {
        let mut config = InventoryConfig::default();
        config.upstream.base_url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "upstream.base_url");
    }

    #[test]
    fn test_half_credentials_rejected() {
        let mut config = InventoryConfig::default();
        config.upstream.password = Some("secret".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "upstream.username");

        config.upstream.username = Some("svc".into());
        assert!(validate_config(&config).is_ok());
    }
}
