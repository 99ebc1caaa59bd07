//! HTTP transport to the inventory API.
//!
//! # Responsibilities
//! - Map logical endpoints onto URLs under the configured base
//! - Attach Basic credentials and `Accept: application/json`
//! - Report either a received response or a transport-level failure
//!
//! Status interpretation is left to the caller; a 500 is still a
//! successfully received response at this layer.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

/// Result of one attempt against the upstream.
pub type Outcome = Result<UpstreamResponse, TransportError>;

/// Logical upstream endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET {base}/GetAssets?pagination=0`
    ListAssets,
    /// `GET {base}/GetAsset/{id}`
    Asset(String),
}

impl Endpoint {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::ListAssets => "list_assets",
            Endpoint::Asset(_) => "get_asset",
        }
    }

    /// Resolve against a base URL that ends with `/`.
    pub fn url(&self, base: &Url) -> Result<Url, TransportError> {
        match self {
            Endpoint::ListAssets => {
                let mut url = join(base, "GetAssets")?;
                url.query_pairs_mut().append_pair("pagination", "0");
                Ok(url)
            }
            Endpoint::Asset(id) => {
                let mut url = join(base, "GetAsset/")?;
                url.path_segments_mut()
                    .map_err(|_| TransportError::InvalidUrl(format!("'{}' cannot be a base", base)))?
                    .pop_if_empty()
                    .push(id);
                Ok(url)
            }
        }
    }
}

fn join(base: &Url, path: &str) -> Result<Url, TransportError> {
    base.join(path)
        .map_err(|e| TransportError::InvalidUrl(format!("{}{}: {}", base, path, e)))
}

/// A response that made it back from the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failures where no usable response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(timeout)
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// An HTTP transport able to perform GETs against the inventory API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, endpoint: &Endpoint) -> Outcome;
}

/// Credentials for Basic authentication.
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Production transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
    credentials: Option<BasicCredentials>,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let base_url = normalize_base(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(config.timeout_secs);
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout);
        if !config.respect_proxy_env {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            credentials: config.credentials(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, endpoint: &Endpoint) -> Outcome {
        let url = endpoint.url(&self.base_url)?;
        tracing::debug!(url = %url, endpoint = endpoint.label(), "Upstream GET");

        let mut request = self.client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;
        Ok(UpstreamResponse { status, body })
    }
}

/// Parse a base URL, ensuring it ends with `/` so relative joins append.
pub fn normalize_base(raw: &str) -> Result<Url, TransportError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|e| TransportError::InvalidUrl(format!("'{}': {}", raw, e)))
}
