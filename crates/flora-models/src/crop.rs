//! Crop recommendation models.
//!
//! The crop proxy forwards an arbitrary JSON object. The seven soil and
//! climate fields it knows about are coerced to floats first; everything
//! else passes through untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Soil and climate fields understood by the crop model.
pub const CROP_FIELDS: [&str; 7] = [
    "nitrogen",
    "phosphorus",
    "potassium",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

/// Crop recommendation input, ready to forward upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams(Value);

impl CropParams {
    /// Build from a JSON body. Known fields are coerced, other keys and
    /// non-object bodies are kept as-is.
    pub fn from_json(mut body: Value) -> Self {
        if let Some(fields) = body.as_object_mut() {
            for name in CROP_FIELDS {
                if let Some(value) = fields.get_mut(name) {
                    *value = Value::from(coerce_number(value));
                }
            }
        }
        Self(body)
    }

    /// Build from urlencoded form fields. Every value is coerced.
    pub fn from_form(form: HashMap<String, String>) -> Self {
        let fields: Map<String, Value> = form
            .into_iter()
            .map(|(key, raw)| (key, Value::from(parse_or_zero(&raw))))
            .collect();
        Self(Value::Object(fields))
    }

    /// Value of a known field, if present and numeric.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Coerce a JSON value to a finite float, defaulting to zero.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_or_zero(s),
        _ => 0.0,
    }
}

fn parse_or_zero(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Aggregated failure returned when no crop endpoint answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropFailure {
    pub error: String,
    pub message: String,
    pub details: String,
    pub suggestion: String,
}

impl CropFailure {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            error: "Could not find the correct crop API endpoint".to_string(),
            message: "The crop recommendation API is running but the endpoint is not found"
                .to_string(),
            details: details.into(),
            suggestion: "Please check the API documentation for the correct endpoint".to_string(),
        }
    }
}

/// Suitability bucket derived from model confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suitability {
    High,
    Medium,
    Low,
}

impl Suitability {
    /// `> 0.8` is High, `> 0.6` is Medium, anything else Low.
    pub fn from_confidence(confidence: Option<f64>) -> Self {
        match confidence {
            Some(c) if c > 0.8 => Suitability::High,
            Some(c) if c > 0.6 => Suitability::Medium,
            _ => Suitability::Low,
        }
    }
}

/// Growing season guessed from the crop name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Spring/Summer")]
    SpringSummer,
    #[serde(rename = "Fall/Winter")]
    FallWinter,
    #[serde(rename = "Various Seasons")]
    Various,
}

const SUMMER_CROPS: [&str; 4] = ["tomato", "pepper", "corn", "cucumber"];
const WINTER_CROPS: [&str; 4] = ["wheat", "cabbage", "broccoli", "carrot"];

impl Season {
    pub fn for_crop(crop: Option<&str>) -> Self {
        let Some(crop) = crop else {
            return Season::Various;
        };
        let crop = crop.to_lowercase();
        if SUMMER_CROPS.iter().any(|c| crop.contains(c)) {
            Season::SpringSummer
        } else if WINTER_CROPS.iter().any(|c| crop.contains(c)) {
            Season::FallWinter
        } else {
            Season::Various
        }
    }
}

const DEFAULT_DESCRIPTION: &str = "Based on your soil and climate conditions.";

/// Display-ready summary of a crop recommendation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub name: String,
    pub suitability: Suitability,
    /// Confidence as a whole percentage
    pub score: u32,
    pub description: String,
    pub season: Season,
}

impl RecommendationSummary {
    /// Map whichever keys the upstream returned onto display fields.
    pub fn from_response(response: &Value) -> Self {
        // Null or empty keys fall through to the next one.
        let crop = ["crop", "recommended_crop"].iter().find_map(|key| {
            response
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        });
        let confidence = response.get("confidence").and_then(Value::as_f64);

        // A zero or missing confidence scores as 50%.
        let score_basis = confidence.filter(|c| *c != 0.0).unwrap_or(0.5);

        let description = ["reasons", "key_factors"]
            .iter()
            .find_map(|key| {
                response
                    .get(*key)
                    .and_then(Value::as_array)
                    .filter(|items| !items.is_empty())
            })
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(". ")
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        Self {
            name: crop.unwrap_or("Unknown Crop").to_string(),
            suitability: Suitability::from_confidence(confidence),
            score: (score_basis * 100.0).round().max(0.0) as u32,
            description,
            season: Season::for_crop(crop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_fields_coerced() {
        let params = CropParams::from_json(json!({
            "nitrogen": "90",
            "phosphorus": 42,
            "potassium": "abc",
            "temperature": null,
            "humidity": true,
            "ph": " 6.5 ",
            "rainfall": "NaN",
            "note": "keep me"
        }));

        assert_eq!(params.get("nitrogen"), Some(90.0));
        assert_eq!(params.get("phosphorus"), Some(42.0));
        assert_eq!(params.get("potassium"), Some(0.0));
        assert_eq!(params.get("temperature"), Some(0.0));
        assert_eq!(params.get("humidity"), Some(0.0));
        assert_eq!(params.get("ph"), Some(6.5));
        assert_eq!(params.get("rainfall"), Some(0.0));
        assert_eq!(params.as_value()["note"], json!("keep me"));
    }

    #[test]
    fn test_missing_fields_not_invented() {
        let params = CropParams::from_json(json!({"nitrogen": 1}));
        assert!(params.as_value().get("rainfall").is_none());
    }

    #[test]
    fn test_non_object_body_passes_through() {
        let body = json!([1, 2, 3]);
        assert_eq!(CropParams::from_json(body.clone()).into_value(), body);
    }

    #[test]
    fn test_form_values_coerced() {
        let form = HashMap::from([
            ("nitrogen".to_string(), "12.5".to_string()),
            ("rainfall".to_string(), "".to_string()),
        ]);
        let params = CropParams::from_form(form);
        assert_eq!(params.get("nitrogen"), Some(12.5));
        assert_eq!(params.get("rainfall"), Some(0.0));
    }

    #[test]
    fn test_suitability_thresholds() {
        assert_eq!(Suitability::from_confidence(Some(0.95)), Suitability::High);
        assert_eq!(Suitability::from_confidence(Some(0.8)), Suitability::Medium);
        assert_eq!(Suitability::from_confidence(Some(0.61)), Suitability::Medium);
        assert_eq!(Suitability::from_confidence(Some(0.6)), Suitability::Low);
        assert_eq!(Suitability::from_confidence(None), Suitability::Low);
    }

    #[test]
    fn test_season_for_crop() {
        assert_eq!(Season::for_crop(Some("Cherry Tomato")), Season::SpringSummer);
        assert_eq!(Season::for_crop(Some("wheat")), Season::FallWinter);
        assert_eq!(Season::for_crop(Some("rice")), Season::Various);
        assert_eq!(Season::for_crop(None), Season::Various);
    }

    #[test]
    fn test_summary_from_reasons() {
        let summary = RecommendationSummary::from_response(&json!({
            "crop": "maize corn",
            "confidence": 0.87,
            "reasons": ["Warm soil", "Enough rain"]
        }));
        assert_eq!(summary.name, "maize corn");
        assert_eq!(summary.suitability, Suitability::High);
        assert_eq!(summary.score, 87);
        assert_eq!(summary.description, "Warm soil. Enough rain");
        assert_eq!(summary.season, Season::SpringSummer);
    }

    #[test]
    fn test_summary_from_key_factors() {
        let summary = RecommendationSummary::from_response(&json!({
            "recommended_crop": "cabbage",
            "confidence": 0.7,
            "key_factors": ["Humidity level in the air (value: 80.0) increased the likelihood of recommending cabbage."]
        }));
        assert_eq!(summary.name, "cabbage");
        assert_eq!(summary.suitability, Suitability::Medium);
        assert_eq!(summary.season, Season::FallWinter);
        assert!(summary.description.starts_with("Humidity level"));
    }

    #[test]
    fn test_summary_skips_null_and_empty_keys() {
        let summary = RecommendationSummary::from_response(&json!({
            "crop": null,
            "recommended_crop": "rice",
            "reasons": null,
            "key_factors": ["Warm"]
        }));
        assert_eq!(summary.name, "rice");
        assert_eq!(summary.description, "Warm");

        let summary = RecommendationSummary::from_response(&json!({
            "crop": "",
            "recommended_crop": "carrot",
            "reasons": [],
            "key_factors": ["Cool nights", "Loose soil"]
        }));
        assert_eq!(summary.name, "carrot");
        assert_eq!(summary.season, Season::FallWinter);
        assert_eq!(summary.description, "Cool nights. Loose soil");
    }

    #[test]
    fn test_summary_defaults() {
        let summary = RecommendationSummary::from_response(&json!({}));
        assert_eq!(summary.name, "Unknown Crop");
        assert_eq!(summary.suitability, Suitability::Low);
        assert_eq!(summary.score, 50);
        assert_eq!(summary.description, DEFAULT_DESCRIPTION);
        assert_eq!(summary.season, Season::Various);

        let serialized = serde_json::to_value(&summary).unwrap();
        assert_eq!(serialized["season"], json!("Various Seasons"));
        assert_eq!(serialized["suitability"], json!("Low"));
    }

    #[test]
    fn test_crop_failure_shape() {
        let body = serde_json::to_value(CropFailure::new("All crop endpoints failed")).unwrap();
        assert_eq!(body["error"], json!("Could not find the correct crop API endpoint"));
        assert_eq!(body["details"], json!("All crop endpoints failed"));
    }
}
