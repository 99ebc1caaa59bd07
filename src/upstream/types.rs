//! Fetch result and error definitions.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::upstream::transport::TransportError;

/// Why a fetch could not produce live data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection or timeout failure that survived all retries.
    #[error("upstream unreachable: {0}")]
    TransientNetwork(TransportError),

    /// Circuit breaker is open; no network attempt was made.
    #[error("upstream unavailable (circuit open), next trial in {retry_in:?}")]
    UpstreamUnavailable { retry_in: Duration },

    /// Upstream refused the credentials.
    #[error("upstream rejected request with status {status}")]
    UpstreamRejected { status: StatusCode },

    /// Any other non-success status, including transient ones after retries.
    #[error("upstream returned status {status}")]
    UnexpectedStatus { status: StatusCode },

    /// A response arrived but its body is unusable.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// No credentials configured; the client runs on fallback data only.
    #[error("upstream credentials not configured")]
    MissingCredentials,

    /// The requested record does not exist upstream.
    #[error("asset not found")]
    NotFound,
}

impl FetchError {
    /// Short label for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::TransientNetwork(_) => "transient_network",
            FetchError::UpstreamUnavailable { .. } => "upstream_unavailable",
            FetchError::UpstreamRejected { .. } => "upstream_rejected",
            FetchError::UnexpectedStatus { .. } => "unexpected_status",
            FetchError::MalformedResponse(_) => "malformed_response",
            FetchError::MissingCredentials => "missing_credentials",
            FetchError::NotFound => "not_found",
        }
    }
}

/// Data returned by the client, tagged with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// Data that came from the upstream.
    Live(T),
    /// Substitute data, with the reason the upstream was not used.
    Fallback { data: T, reason: FetchError },
}

impl<T> Fetched<T> {
    pub fn data(&self) -> &T {
        match self {
            Fetched::Live(data) => data,
            Fetched::Fallback { data, .. } => data,
        }
    }

    /// Drop the provenance and keep the data.
    pub fn into_inner(self) -> T {
        match self {
            Fetched::Live(data) => data,
            Fetched::Fallback { data, .. } => data,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Fetched::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FetchError> {
        match self {
            Fetched::Live(_) => None,
            Fetched::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn source(&self) -> &'static str {
        if self.is_fallback() {
            "fallback"
        } else {
            "live"
        }
    }

    /// Transform the data, keeping the provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Live(data) => Fetched::Live(f(data)),
            Fetched::Fallback { data, reason } => Fetched::Fallback {
                data: f(data),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keeps_provenance() {
        let fetched = Fetched::Fallback {
            data: vec![1, 2, 3],
            reason: FetchError::MissingCredentials,
        };
        let mapped = fetched.map(|v| v.len());
        assert_eq!(mapped.data(), &3);
        assert_eq!(mapped.fallback_reason(), Some(&FetchError::MissingCredentials));
        assert_eq!(mapped.source(), "fallback");

        let live = Fetched::Live("x").map(str::len);
        assert!(!live.is_fallback());
        assert_eq!(live.into_inner(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::UpstreamRejected {
            status: StatusCode::FORBIDDEN,
        };
        assert_eq!(err.to_string(), "upstream rejected request with status 403 Forbidden");
        assert_eq!(err.kind(), "upstream_rejected");
    }
}
