//! Inference service HTTP client.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use flora_models::image_data_url;

use crate::error::{MlError, MlResult};
use crate::types::{CropRecommendation, EndpointAttempt, HealthResponse, PredictRequest};

/// Hosted plant disease classifier.
pub const DEFAULT_DISEASE_URL: &str = "https://mai-22-plant-disease-detection.hf.space/run/predict";

/// Hosted crop recommender.
pub const DEFAULT_CROP_BASE_URL: &str = "https://mai-22-crop-recommendation-deployment.hf.space";

/// Crop paths tried in order when no path is configured.
pub const CROP_CANDIDATE_PATHS: [&str; 6] = [
    "/recommend",
    "/predict",
    "/api/recommend",
    "/api/predict",
    "/analyze",
    "/classify",
];

/// Configuration for the inference client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Full URL of the disease prediction endpoint
    pub disease_url: String,
    /// Base URL of the crop service
    pub crop_base_url: String,
    /// Crop paths, tried in order
    pub crop_paths: Vec<String>,
    /// Per-call timeout
    pub timeout: Duration,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            disease_url: DEFAULT_DISEASE_URL.to_string(),
            crop_base_url: DEFAULT_CROP_BASE_URL.to_string(),
            crop_paths: CROP_CANDIDATE_PATHS.iter().map(|p| p.to_string()).collect(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    ///
    /// `CROP_API_PATH` pins the crop service to one path and turns off
    /// candidate probing.
    pub fn from_env() -> Self {
        let crop_paths = match std::env::var("CROP_API_PATH") {
            Ok(path) if !path.trim().is_empty() => vec![normalize_path(&path)],
            _ => CROP_CANDIDATE_PATHS.iter().map(|p| p.to_string()).collect(),
        };

        Self {
            disease_url: std::env::var("DISEASE_API_URL")
                .unwrap_or_else(|_| DEFAULT_DISEASE_URL.to_string()),
            crop_base_url: std::env::var("CROP_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CROP_BASE_URL.to_string()),
            crop_paths,
            timeout: Duration::from_secs(
                std::env::var("ML_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Point both services at one base URL. Used by tests and local mocks.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            disease_url: format!("{}/run/predict", base),
            crop_base_url: base.to_string(),
            ..Self::default()
        }
    }

    /// Check that both URLs parse and at least one crop path is set.
    pub fn validate(&self) -> MlResult<()> {
        for (name, raw) in [
            ("DISEASE_API_URL", &self.disease_url),
            ("CROP_API_BASE_URL", &self.crop_base_url),
        ] {
            Url::parse(raw).map_err(|e| MlError::InvalidConfig(format!("{} '{}': {}", name, raw, e)))?;
        }
        if self.crop_paths.is_empty() {
            return Err(MlError::InvalidConfig("no crop endpoint paths configured".to_string()));
        }
        Ok(())
    }

    /// Whether the crop service is reached through candidate probing.
    pub fn probes_crop_paths(&self) -> bool {
        self.crop_paths.len() > 1
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Client for the hosted inference services.
pub struct MlClient {
    http: Client,
    config: MlClientConfig,
}

impl MlClient {
    /// Create a new client.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    pub fn config(&self) -> &MlClientConfig {
        &self.config
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }

    /// Classify a leaf image. Returns the upstream JSON unmodified.
    ///
    /// One attempt only; any transport, status or decoding failure is
    /// returned to the caller.
    pub async fn classify_image(&self, mime: &str, bytes: &[u8]) -> MlResult<Value> {
        let request = PredictRequest::image(image_data_url(mime, bytes));

        debug!(url = %self.config.disease_url, bytes = bytes.len(), "Sending disease prediction request");

        let response = self
            .http
            .post(&self.config.disease_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MlError::from_transport(e, self.timeout_ms()))?;

        self.read_json(response).await
    }

    /// Ask the crop service for a recommendation.
    ///
    /// Paths are tried strictly in configured order; the first 2xx answer
    /// with a JSON body wins and is returned verbatim.
    pub async fn recommend_crop(&self, params: &Value) -> MlResult<CropRecommendation> {
        let base = self.config.crop_base_url.trim_end_matches('/');
        let mut failed = Vec::with_capacity(self.config.crop_paths.len());

        for path in &self.config.crop_paths {
            let url = format!("{}{}", base, path);
            debug!(url = %url, "Trying crop endpoint");

            let outcome = match self.http.post(&url).json(params).send().await {
                Ok(response) => self.read_json(response).await,
                Err(e) => Err(MlError::from_transport(e, self.timeout_ms())),
            };

            match outcome {
                Ok(body) => {
                    info!(path = %path, failed = failed.len(), "Crop endpoint answered");
                    return Ok(CropRecommendation {
                        path: path.clone(),
                        body,
                        failed_attempts: failed,
                    });
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Crop endpoint failed");
                    failed.push(EndpointAttempt {
                        path: path.clone(),
                        reason: attempt_reason(&e),
                    });
                }
            }
        }

        Err(MlError::NoEndpointMatched(failed))
    }

    async fn read_json(&self, response: Response) -> MlResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MlError::from_transport(e, self.timeout_ms()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| MlError::InvalidResponse(format!("upstream body is not JSON: {}", e)))
    }

    /// Check whether the crop service reports itself healthy.
    pub async fn crop_health(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.crop_base_url.trim_end_matches('/'));

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response
                    .json()
                    .await
                    .map_err(|e| MlError::InvalidResponse(e.to_string()))?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Crop service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Crop service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Check whether the disease service host answers at all.
    pub async fn disease_health(&self) -> MlResult<bool> {
        let root = Url::parse(&self.config.disease_url)
            .and_then(|u| u.join("/"))
            .map_err(|e| MlError::InvalidConfig(e.to_string()))?;

        match self.http.get(root).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Disease service health check error: {}", e);
                Ok(false)
            }
        }
    }
}

fn attempt_reason(err: &MlError) -> String {
    match err {
        MlError::UpstreamStatus { status, .. } => status.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MlClient {
        MlClient::new(MlClientConfig::with_base_url(&server.uri())).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.disease_url, DEFAULT_DISEASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.crop_paths.len(), 6);
        assert!(config.probes_crop_paths());
    }

    #[test]
    fn test_config_rejects_bad_url() {
        let config = MlClientConfig {
            crop_base_url: "not a url".to_string(),
            ..MlClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(MlError::InvalidConfig(_))));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("recommend"), "/recommend");
        assert_eq!(normalize_path(" /api/predict "), "/api/predict");
    }

    #[tokio::test]
    async fn test_classify_sends_data_url() {
        let server = MockServer::start().await;
        let upstream = json!({"data": [{"status": "Healthy", "overall_confidence": 0.97}]});

        Mock::given(method("POST"))
            .and(path("/run/predict"))
            .and(body_json(json!({"data": ["data:image/png;base64,bGVhZg=="]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server).classify_image("image/png", b"leaf").await;
        assert_eq!(tokio_test::assert_ok!(body), upstream);
    }

    #[tokio::test]
    async fn test_classify_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run/predict"))
            .respond_with(ResponseTemplate::new(503).set_body_string("sleeping"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .classify_image("image/jpeg", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, MlError::UpstreamStatus { status: 503, .. }));
        assert_eq!(err.to_string(), "Request failed with status code 503");
    }

    #[tokio::test]
    async fn test_classify_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut config = MlClientConfig::with_base_url(&server.uri());
        config.timeout = Duration::from_millis(50);
        let client = MlClient::new(config).unwrap();

        let err = client.classify_image("image/png", b"x").await.unwrap_err();
        assert!(matches!(err, MlError::Timeout(50)));
    }

    #[tokio::test]
    async fn test_crop_first_success_wins() {
        let server = MockServer::start().await;
        let answer = json!({"crop": "rice", "confidence": 0.9});

        Mock::given(method("POST"))
            .and(path("/recommend"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/recommend"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer.clone()))
            .expect(1)
            .mount(&server)
            .await;
        // Later candidates must never be reached
        Mock::given(method("POST"))
            .and(path("/api/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"crop": "wrong"})))
            .expect(0)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .recommend_crop(&json!({"nitrogen": 90.0}))
            .await
            .unwrap();

        assert_eq!(result.path, "/api/recommend");
        assert_eq!(result.body, answer);
        assert_eq!(
            result.failed_attempts,
            vec![
                EndpointAttempt { path: "/recommend".to_string(), reason: "404".to_string() },
                EndpointAttempt { path: "/predict".to_string(), reason: "500".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_crop_non_json_success_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommend"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>space</html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"crop": "maize"})))
            .mount(&server)
            .await;

        let result = client_for(&server).recommend_crop(&json!({})).await.unwrap();
        assert_eq!(result.path, "/predict");
        assert_eq!(result.failed_attempts.len(), 1);
    }

    #[tokio::test]
    async fn test_crop_all_candidates_fail_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .expect(6)
            .mount(&server)
            .await;

        let err = client_for(&server).recommend_crop(&json!({})).await.unwrap_err();
        let MlError::NoEndpointMatched(attempts) = err else {
            panic!("expected NoEndpointMatched");
        };
        let tried: Vec<&str> = attempts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(tried, CROP_CANDIDATE_PATHS.to_vec());

        let requests = server.received_requests().await.unwrap();
        let order: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
        assert_eq!(order, CROP_CANDIDATE_PATHS.to_vec());
    }

    #[tokio::test]
    async fn test_crop_pinned_path_does_not_probe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommend"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = MlClientConfig::with_base_url(&server.uri());
        config.crop_paths = vec!["/recommend".to_string()];
        assert!(!config.probes_crop_paths());
        let client = MlClient::new(config).unwrap();

        let err = client.recommend_crop(&json!({})).await.unwrap_err();
        assert!(matches!(err, MlError::NoEndpointMatched(ref a) if a.len() == 1));
    }

    #[tokio::test]
    async fn test_crop_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "healthy", "model_initialized": true})),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server).crop_health().await.unwrap());
    }

    #[tokio::test]
    async fn test_disease_health_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        assert!(!client_for(&server).disease_health().await.unwrap());
    }
}
