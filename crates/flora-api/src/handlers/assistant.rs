//! Plant assistant handlers.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use flora_models::{AssistantMessage, ChatRequest, GREETING};
use validator::Validate;

use crate::error::{ApiError, ApiResult};

/// GET /api/assistant
pub async fn greeting() -> Json<AssistantMessage> {
    Json(AssistantMessage::bot(GREETING))
}

/// POST /api/assistant
pub async fn ask_assistant(
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<AssistantMessage>> {
    let Json(request) = request.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = request.trimmed();
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    Ok(Json(AssistantMessage::reply_to(&request.message)))
}
