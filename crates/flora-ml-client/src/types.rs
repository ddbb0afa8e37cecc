//! Inference service request/response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gradio-style prediction request: `{"data": ["data:image/...;base64,..."]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub data: Vec<String>,
}

impl PredictRequest {
    pub fn image(data_url: impl Into<String>) -> Self {
        Self {
            data: vec![data_url.into()],
        }
    }
}

/// A crop candidate path that did not answer successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointAttempt {
    pub path: String,
    /// Upstream status code or transport error message
    pub reason: String,
}

/// Successful crop recommendation.
#[derive(Debug, Clone)]
pub struct CropRecommendation {
    /// Candidate path that answered
    pub path: String,
    /// Upstream JSON, unmodified
    pub body: Value,
    /// Candidates that failed before this one
    pub failed_attempts: Vec<EndpointAttempt>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_initialized: Option<bool>,
}
