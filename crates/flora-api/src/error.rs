//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flora_ml_client::MlError;
use flora_models::{CropFailure, DiseaseFailure};
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image provided")]
    MissingImage(Option<String>),

    #[error("Only image files are allowed! (got {0})")]
    NotAnImage(String),

    #[error("Image exceeds the {limit} byte limit")]
    ImageTooLarge { limit: usize },

    #[error("Disease detection failed: {0}")]
    DiseaseUpstream(MlError),

    #[error("Crop recommendation failed: {0}")]
    CropUpstream(MlError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingImage(_)
            | ApiError::NotAnImage(_)
            | ApiError::BadRequest(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::DiseaseUpstream(_) | ApiError::CropUpstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Upload rejection body: `{error, message?}`.
#[derive(Serialize)]
struct UploadErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ApiError::MissingImage(message) => (
                status,
                Json(UploadErrorResponse {
                    error: "No image provided".to_string(),
                    message,
                }),
            )
                .into_response(),
            ApiError::NotAnImage(_) => (
                status,
                Json(UploadErrorResponse {
                    error: "No image provided".to_string(),
                    message: Some("Only image files are allowed!".to_string()),
                }),
            )
                .into_response(),
            ApiError::ImageTooLarge { limit } => (
                status,
                Json(UploadErrorResponse {
                    error: "Image too large".to_string(),
                    message: Some(format!("Images must be at most {} bytes", limit)),
                }),
            )
                .into_response(),
            ApiError::DiseaseUpstream(err) => {
                (status, Json(DiseaseFailure::new(err.to_string()))).into_response()
            }
            ApiError::CropUpstream(err) => {
                (status, Json(CropFailure::new(err.to_string()))).into_response()
            }
            ApiError::BadRequest(_) | ApiError::Validation(_) => {
                let detail = self.to_string();
                (status, Json(ErrorResponse { detail })).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_image_body() {
        let (status, body) = body_of(ApiError::MissingImage(None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No image provided"}));
    }

    #[tokio::test]
    async fn test_not_an_image_body() {
        let (status, body) = body_of(ApiError::NotAnImage("text/plain".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No image provided");
        assert_eq!(body["message"], "Only image files are allowed!");
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let (status, body) = body_of(ApiError::bad_request("Expected a JSON object")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Bad request: Expected a JSON object"}));
    }

    #[tokio::test]
    async fn test_crop_failure_body() {
        let err = ApiError::CropUpstream(MlError::NoEndpointMatched(Vec::new()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Could not find the correct crop API endpoint");
        assert_eq!(body["details"], "All crop endpoints failed");
    }

    #[tokio::test]
    async fn test_disease_failure_body() {
        let err = ApiError::DiseaseUpstream(MlError::Timeout(30_000));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "timeout of 30000ms exceeded");
    }
}
