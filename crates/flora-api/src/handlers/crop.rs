//! Crop recommendation handlers.

use std::collections::HashMap;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use flora_ml_client::CropRecommendation;
use flora_models::{CropParams, RecommendationSummary};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Read crop parameters from a JSON or urlencoded form body.
///
/// A body without a content type is read as JSON; an empty one counts as `{}`.
pub async fn read_crop_params(request: Request, state: &AppState) -> ApiResult<CropParams> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match content_type.as_deref() {
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(request, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Ok(CropParams::from_form(fields))
        }
        Some(_) => {
            let Json(body) = Json::<Value>::from_request(request, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Ok(CropParams::from_json(body))
        }
        None => {
            let bytes = Bytes::from_request(request, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            if bytes.is_empty() {
                return Ok(CropParams::from_json(Value::Object(Map::new())));
            }
            let body = serde_json::from_slice(&bytes).map_err(|e| {
                ApiError::bad_request(format!("Failed to parse the request body as JSON: {}", e))
            })?;
            Ok(CropParams::from_json(body))
        }
    }
}

/// Forward parameters to the crop service, recording attempts.
async fn forward(state: &AppState, params: &CropParams) -> ApiResult<CropRecommendation> {
    info!(params = %params.as_value(), "Crop recommendation request");

    let start = Instant::now();
    let result = state.ml.recommend_crop(params.as_value()).await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(recommendation) => {
            for attempt in &recommendation.failed_attempts {
                metrics::record_crop_endpoint_failure(&attempt.path);
            }
            metrics::record_upstream_call("crop", "ok", elapsed);
            Ok(recommendation)
        }
        Err(e) => {
            if let flora_ml_client::MlError::NoEndpointMatched(attempts) = &e {
                for attempt in attempts {
                    metrics::record_crop_endpoint_failure(&attempt.path);
                }
            }
            metrics::record_upstream_call("crop", e.kind(), elapsed);
            error!(error = %e, "All crop endpoints failed");
            Err(ApiError::CropUpstream(e))
        }
    }
}

/// POST /api/crop-recommendation
///
/// Relays the upstream JSON verbatim.
pub async fn recommend_crop(State(state): State<AppState>, request: Request) -> ApiResult<Json<Value>> {
    let params = read_crop_params(request, &state).await?;
    let recommendation = forward(&state, &params).await?;
    Ok(Json(recommendation.body))
}

/// Relayed recommendation plus its display summary.
#[derive(Serialize)]
pub struct CropSummaryResponse {
    pub recommendation: Value,
    pub summary: RecommendationSummary,
    /// Crop service path that answered
    pub endpoint: String,
}

/// POST /api/crop-recommendation/summary
pub async fn recommend_crop_summary(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<CropSummaryResponse>> {
    let params = read_crop_params(request, &state).await?;
    let recommendation = forward(&state, &params).await?;
    let summary = RecommendationSummary::from_response(&recommendation.body);

    Ok(Json(CropSummaryResponse {
        recommendation: recommendation.body,
        summary,
        endpoint: recommendation.path,
    }))
}
