//! Shared data models for the Flora plant-care gateway.
//!
//! This crate provides Serde-serializable types for:
//! - Disease detection envelopes and image data URLs
//! - Crop recommendation parameters and result summaries
//! - The keyword-driven plant assistant

pub mod assistant;
pub mod crop;
pub mod disease;

// Re-export common types
pub use assistant::{reply_for, AssistantMessage, ChatRequest, Sender, GREETING};
pub use crop::{CropFailure, CropParams, RecommendationSummary, Season, Suitability, CROP_FIELDS};
pub use disease::{
    image_data_url, is_image_mime, mime_subtype, DiseaseEnvelope, DiseaseFailure, DiseaseVerdict,
    DISEASE_MODEL_NAME,
};
