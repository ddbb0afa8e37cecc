//! Disease detection models.
//!
//! The upstream classifier is fed a base64 data URL and answers with an
//! opaque JSON document. The envelope keeps that document verbatim and only
//! adds provenance fields around it.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model name reported in every success envelope.
pub const DISEASE_MODEL_NAME: &str = "Plant Disease Detection (Hugging Face Space)";

/// Static hint attached to every failure envelope.
pub const DISEASE_FAILURE_HINT: &str =
    "Make sure the Hugging Face Space is running and supports /run/predict endpoint";

/// Documentation link attached to every failure envelope.
pub const DISEASE_FAILURE_REFERENCE: &str =
    "https://huggingface.co/docs/api-inference/detailed_parameters#image-inputs";

/// Map a declared MIME type to the subtype used in the data URL.
///
/// Unrecognized types fall back to `jpeg`.
pub fn mime_subtype(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpeg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg+xml",
        _ => "jpeg",
    }
}

/// Whether a declared content type is an image type.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Build the `data:image/<subtype>;base64,...` URL sent upstream.
pub fn image_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:image/{};base64,{}", mime_subtype(mime), STANDARD.encode(bytes))
}

/// Success envelope around the raw upstream prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseEnvelope {
    pub success: bool,
    pub model: String,
    pub source: String,
    /// RFC 3339 UTC timestamp of the response
    pub timestamp: String,
    /// Upstream response, unmodified
    pub prediction: Value,
    /// Readable verdict, when the prediction has a recognizable shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<DiseaseVerdict>,
}

impl DiseaseEnvelope {
    /// Wrap an upstream prediction.
    pub fn new(source: impl Into<String>, prediction: Value) -> Self {
        Self::at(source, prediction, Utc::now())
    }

    /// Wrap an upstream prediction with an explicit timestamp.
    pub fn at(source: impl Into<String>, prediction: Value, now: DateTime<Utc>) -> Self {
        let verdict = DiseaseVerdict::from_prediction(&prediction);
        Self {
            success: true,
            model: DISEASE_MODEL_NAME.to_string(),
            source: source.into(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            prediction,
            verdict,
        }
    }
}

/// Failure envelope returned when the upstream call fails for any reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseFailure {
    pub success: bool,
    pub error: String,
    pub message: String,
    pub hint: String,
    pub reference: String,
}

impl DiseaseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: "Disease detection failed".to_string(),
            message: message.into(),
            hint: DISEASE_FAILURE_HINT.to_string(),
            reference: DISEASE_FAILURE_REFERENCE.to_string(),
        }
    }
}

/// Loose reading of `{status, overall_confidence}` out of a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseVerdict {
    /// "Healthy" or "Diseased" as reported upstream
    pub status: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Confidence formatted as a percentage with two decimals
    pub confidence_percent: String,
}

impl DiseaseVerdict {
    /// Find a verdict at the top level, under `prediction`, or as the first
    /// element of a Gradio-style `data` array.
    pub fn from_prediction(value: &Value) -> Option<Self> {
        Self::read(value)
            .or_else(|| value.get("prediction").and_then(Self::read))
            .or_else(|| {
                value
                    .get("data")
                    .and_then(Value::as_array)
                    .and_then(|items| items.first())
                    .and_then(Self::read)
            })
    }

    fn read(value: &Value) -> Option<Self> {
        let status = value.get("status")?.as_str()?.to_string();
        let confidence = value.get("overall_confidence")?.as_f64()?;
        Some(Self {
            status,
            confidence,
            confidence_percent: format!("{:.2}%", confidence * 100.0),
        })
    }
}
