//! ML client error types.

use thiserror::Error;

use crate::types::EndpointAttempt;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("timeout of {0}ms exceeded")]
    Timeout(u64),

    #[error("Request failed with status code {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("All crop endpoints failed")]
    NoEndpointMatched(Vec<EndpointAttempt>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MlError {
    /// Convert a transport error, separating out timeouts.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            MlError::Timeout(timeout_ms)
        } else {
            MlError::Network(err)
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MlError::Timeout(_) => "timeout",
            MlError::UpstreamStatus { .. } => "upstream_status",
            MlError::InvalidResponse(_) => "invalid_response",
            MlError::NoEndpointMatched(_) => "no_endpoint",
            MlError::InvalidConfig(_) => "config",
            MlError::Network(_) => "network",
        }
    }
}
