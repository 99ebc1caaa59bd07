//! Inventory API client with retries, circuit breaking and fallback.
//!
//! # Responsibilities
//! - Gate every upstream call through the circuit breaker
//! - Retry transient outcomes inside a permitted call
//! - Classify responses and decode bodies
//! - Degrade to the fallback dataset instead of surfacing errors
//!
//! # Breaker accounting
//! A call counts as a failure when it ends in a transport error, a
//! transient status, 401/403, or any 5xx. Every other response (404 and
//! 2xx bodies that fail to decode included) counts as a success, since
//! the upstream did answer.

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::inventory::{fallback, select_inactive_computers, wire, AssetRecord};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::resilience::{CircuitBreaker, RetryPolicy};
use crate::upstream::transport::{
    Endpoint, Outcome, ReqwestTransport, Transport, TransportError, UpstreamResponse,
};
use crate::upstream::types::{FetchError, Fetched};

struct ClientInner {
    /// `None` when no credentials are configured.
    transport: Option<Arc<dyn Transport>>,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    attempt_timeout: Duration,
    enterprise: Option<String>,
}

/// Resilient client for the inventory API.
///
/// Cloning is cheap; clones share one circuit breaker.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: Arc<ClientInner>,
}

impl UpstreamClient {
    /// Build a client with the production HTTP transport.
    ///
    /// Without credentials the client runs in fallback-only mode and never
    /// touches the network.
    pub fn from_config(config: &InventoryConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(&config.upstream)?;
        if !transport.has_credentials() {
            tracing::warn!(
                base_url = %transport.base_url(),
                "No upstream credentials configured, serving fallback data only"
            );
            return Ok(Self::fallback_only(config));
        }

        tracing::info!(
            base_url = %transport.base_url(),
            timeout_secs = config.upstream.timeout_secs,
            "Inventory client initialized"
        );
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Build a client around an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &InventoryConfig) -> Self {
        Self::build(Some(transport), config)
    }

    /// Build a client that always serves fallback data.
    pub fn fallback_only(config: &InventoryConfig) -> Self {
        Self::build(None, config)
    }

    fn build(transport: Option<Arc<dyn Transport>>, config: &InventoryConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                retry: RetryPolicy::from_config(&config.retries),
                breaker: CircuitBreaker::from_config(&config.circuit_breaker),
                attempt_timeout: Duration::from_secs(config.upstream.timeout_secs),
                enterprise: config.upstream.enterprise.clone(),
            }),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.inner.breaker
    }

    pub fn is_fallback_only(&self) -> bool {
        self.inner.transport.is_none()
    }

    /// Fetch the full inventory. Never fails; degrades to fallback data.
    pub async fn fetch_all(&self) -> Fetched<Vec<AssetRecord>> {
        let span = tracing::info_span!(
            "fetch_all",
            fetch_id = %Uuid::new_v4(),
            enterprise = self.enterprise_label()
        );

        async move {
            tracing::info!("Fetching all assets");
            let fetched = match self.try_fetch_all().await {
                Ok(records) => {
                    tracing::info!(count = records.len(), "Fetched assets from upstream");
                    Fetched::Live(records)
                }
                Err(reason) => {
                    tracing::warn!(
                        reason = %reason,
                        kind = reason.kind(),
                        "Serving fallback asset dataset"
                    );
                    Fetched::Fallback {
                        data: fallback::dataset(),
                        reason,
                    }
                }
            };
            metrics::record_fetch(Endpoint::ListAssets.label(), fetched.source());
            fetched
        }
        .instrument(span)
        .await
    }

    /// Fetch one asset by id.
    ///
    /// A 404 is a real answer and yields `Live(None)`. Any other failure
    /// falls back to the fallback record with the same id, if there is one.
    pub async fn fetch_by_id(&self, id: &str) -> Fetched<Option<AssetRecord>> {
        let span = tracing::info_span!(
            "fetch_by_id",
            fetch_id = %Uuid::new_v4(),
            enterprise = self.enterprise_label(),
            asset_id = %id
        );

        async move {
            if id.trim().is_empty() {
                tracing::debug!("Empty asset id, nothing to fetch");
                return Fetched::Live(None);
            }

            let endpoint = Endpoint::Asset(id.to_string());
            let fetched = match self.try_fetch_by_id(&endpoint).await {
                Ok(record) => {
                    tracing::info!(name = %record.name(), "Asset found");
                    Fetched::Live(Some(record))
                }
                Err(FetchError::NotFound) => {
                    tracing::warn!("Asset not found upstream");
                    Fetched::Live(None)
                }
                Err(reason) => {
                    let data = fallback::find(id);
                    tracing::warn!(
                        reason = %reason,
                        kind = reason.kind(),
                        found = data.is_some(),
                        "Serving fallback asset lookup"
                    );
                    Fetched::Fallback { data, reason }
                }
            };
            metrics::record_fetch(endpoint.label(), fetched.source());
            fetched
        }
        .instrument(span)
        .await
    }

    /// Fetch the inventory and keep inactive computers, longest silence first.
    pub async fn fetch_inactive_computers(&self) -> Fetched<Vec<AssetRecord>> {
        let fetched = self.fetch_all().await;
        let total = fetched.data().len();
        let inactive = fetched.map(|records| select_inactive_computers(&records));

        tracing::info!(
            count = inactive.data().len(),
            total,
            source = inactive.source(),
            "Selected inactive computers"
        );
        for computer in inactive.data() {
            tracing::warn!(
                name = %computer.name(),
                days = computer.days_since_last_communication(),
                last_communication = %computer
                    .last_communication_at()
                    .map(|at| at.format("%d/%m/%Y").to_string())
                    .unwrap_or_else(|| "never".to_string()),
                "Inactive computer"
            );
        }
        inactive
    }

    async fn try_fetch_all(&self) -> Result<Vec<AssetRecord>, FetchError> {
        let response = self.call(&Endpoint::ListAssets).await?;
        let body = successful_body(response).map_err(|e| match e {
            FetchError::NotFound => FetchError::UnexpectedStatus {
                status: StatusCode::NOT_FOUND,
            },
            other => other,
        })?;

        let records = wire::parse_asset_list(&body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
        if records.is_empty() {
            return Err(FetchError::MalformedResponse("empty asset list".to_string()));
        }
        Ok(records)
    }

    async fn try_fetch_by_id(&self, endpoint: &Endpoint) -> Result<AssetRecord, FetchError> {
        let response = self.call(endpoint).await?;
        let body = successful_body(response)?;
        wire::parse_asset(&body).map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }

    /// One breaker-gated call, retried inside the permit.
    async fn call(&self, endpoint: &Endpoint) -> Result<UpstreamResponse, FetchError> {
        let Some(transport) = &self.inner.transport else {
            return Err(FetchError::MissingCredentials);
        };
        let deadline = self.inner.attempt_timeout;

        let outcome = self
            .inner
            .breaker
            .call(
                move || {
                    self.inner
                        .retry
                        .execute(move || with_deadline(deadline, transport.get(endpoint)))
                },
                |outcome: &Outcome| self.counts_as_failure(outcome),
            )
            .await
            .map_err(|open| {
                tracing::warn!(
                    retry_in_secs = open.retry_in.as_secs_f64(),
                    cooldown_secs = self.inner.breaker.cooldown().as_secs(),
                    "Circuit open, skipping upstream"
                );
                FetchError::UpstreamUnavailable {
                    retry_in: open.retry_in,
                }
            })?;

        outcome.map_err(FetchError::TransientNetwork)
    }

    fn counts_as_failure(&self, outcome: &Outcome) -> bool {
        match outcome {
            Err(_) => true,
            Ok(response) => {
                let status = response.status;
                is_auth_rejection(status)
                    || status.is_server_error()
                    || self.inner.retry.is_transient_status(status)
            }
        }
    }

    fn enterprise_label(&self) -> &str {
        self.inner.enterprise.as_deref().unwrap_or("-")
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("fallback_only", &self.is_fallback_only())
            .field("breaker", &self.inner.breaker.state())
            .field("enterprise", &self.inner.enterprise)
            .finish()
    }
}

fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Turn a received response into a usable body or a classified error.
fn successful_body(response: UpstreamResponse) -> Result<String, FetchError> {
    let status = response.status;
    if is_auth_rejection(status) {
        return Err(FetchError::UpstreamRejected { status });
    }
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound);
    }
    if !status.is_success() {
        return Err(FetchError::UnexpectedStatus { status });
    }
    if response.body.trim().is_empty() {
        return Err(FetchError::MalformedResponse("empty body".to_string()));
    }
    Ok(response.body)
}
