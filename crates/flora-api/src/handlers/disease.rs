//! Disease detection handler.
//!
//! Accepts a single multipart `image` field, forwards it to the hosted
//! classifier as a base64 data URL, and wraps whatever comes back.

use std::time::Instant;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use flora_models::{is_image_mime, DiseaseEnvelope};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Name of the multipart field carrying the leaf image.
pub const IMAGE_FIELD: &str = "image";

/// Uploaded image, validated.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Pull the `image` field out of a multipart body.
///
/// Rejects missing or empty files, non-image content types, and files over
/// `max_bytes`. Other fields are ignored.
pub async fn read_image_upload(mut multipart: Multipart, max_bytes: usize) -> ApiResult<ImageUpload> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::MissingImage(None)),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::ImageTooLarge { limit: max_bytes })
            }
            Err(e) => return Err(ApiError::MissingImage(Some(e.body_text()))),
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_image_mime(&content_type) {
            return Err(ApiError::NotAnImage(content_type));
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::ImageTooLarge { limit: max_bytes })
            }
            Err(e) => return Err(ApiError::MissingImage(Some(e.body_text()))),
        };

        if bytes.is_empty() {
            return Err(ApiError::MissingImage(None));
        }
        if bytes.len() > max_bytes {
            return Err(ApiError::ImageTooLarge { limit: max_bytes });
        }

        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
}

fn rejection_reason(err: &ApiError) -> &'static str {
    match err {
        ApiError::NotAnImage(_) => "not_image",
        ApiError::ImageTooLarge { .. } => "too_large",
        _ => "missing",
    }
}

/// POST /api/disease
pub async fn detect_disease(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DiseaseEnvelope>> {
    let multipart = multipart.map_err(|e| ApiError::MissingImage(Some(e.body_text())))?;

    let upload = match read_image_upload(multipart, state.config.max_upload_bytes).await {
        Ok(upload) => upload,
        Err(e) => {
            metrics::record_upload_rejected(rejection_reason(&e));
            info!(error = %e, "Rejected disease upload");
            return Err(e);
        }
    };

    metrics::record_upload_bytes(upload.bytes.len());
    info!(
        file = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        content_type = %upload.content_type,
        size = upload.bytes.len(),
        "Image received, sending to disease service"
    );

    let source = state.ml.config().disease_url.clone();
    let start = Instant::now();
    let result = state
        .ml
        .classify_image(&upload.content_type, &upload.bytes)
        .await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(prediction) => {
            metrics::record_upstream_call("disease", "ok", elapsed);
            info!(duration_ms = (elapsed * 1000.0) as u64, "Disease service responded");
            Ok(Json(DiseaseEnvelope::new(source, prediction)))
        }
        Err(e) => {
            metrics::record_upstream_call("disease", e.kind(), elapsed);
            error!(error = %e, "Disease detection failed");
            Err(ApiError::DiseaseUpstream(e))
        }
    }
}
