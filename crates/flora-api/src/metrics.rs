//! Prometheus metrics for the gateway.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "flora_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "flora_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "flora_http_requests_in_flight";

    // Upstream inference metrics
    pub const UPSTREAM_CALLS_TOTAL: &str = "flora_upstream_calls_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "flora_upstream_duration_seconds";
    pub const CROP_ENDPOINT_FAILURES_TOTAL: &str = "flora_crop_endpoint_failures_total";

    // Uploads
    pub const UPLOAD_BYTES: &str = "flora_upload_bytes";
    pub const UPLOADS_REJECTED_TOTAL: &str = "flora_uploads_rejected_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "flora_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one call to an inference service.
pub fn record_upstream_call(service: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("service", service.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::UPSTREAM_CALLS_TOTAL, &labels).increment(1);
    histogram!(names::UPSTREAM_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a crop candidate path that did not answer.
pub fn record_crop_endpoint_failure(path: &str) {
    let labels = [("path", path.to_string())];
    counter!(names::CROP_ENDPOINT_FAILURES_TOTAL, &labels).increment(1);
}

/// Record the size of an accepted upload.
pub fn record_upload_bytes(bytes: usize) {
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record a rejected upload.
pub fn record_upload_rejected(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::UPLOADS_REJECTED_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Route template for labels; unmatched paths collapse to one value.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
