//! Plant assistant messages.
//!
//! Replies come from a fixed keyword table; there is no language model
//! behind the assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Opening message shown before the user has asked anything.
pub const GREETING: &str =
    "Hello! I'm Flora, your smart plant care assistant 🌿 How can I help today?";

const FALLBACK_REPLY: &str = "I'm here to assist you with anything related to plants 🌿 Try asking about 'plant disease' or 'crop recommendation'.";

/// Keywords (English and Arabic) and the reply they trigger, in match order.
const REPLIES: &[(&[&str], &str)] = &[
    (
        &["disease", "مرض"],
        "You can upload a picture of the plant leaf to the Disease Detection system, and I’ll tell you whether the plant is healthy or sick 🌱",
    ),
    (
        &["crop", "محصول"],
        "The Crop Recommendation system helps you choose the most suitable crops based on soil and climate conditions 🌾",
    ),
    (
        &["team", "فريق"],
        "Flora was developed by a talented team of four students: Mai Mohamed, Shahd Hesham, Nour Hossam, and Selvia Nasser 💚",
    ),
    (
        &["how", "كيف"],
        "Flora uses advanced AI models to analyze plant images and agricultural data 🤖",
    ),
];

/// Pick the reply for a user message. First matching keyword wins.
pub fn reply_for(input: &str) -> &'static str {
    let input = input.to_lowercase();
    REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| input.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(FALLBACK_REPLY)
}

/// Who sent a chat message. The gateway only ever answers as the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Bot,
}

/// Incoming chat message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 1000, message = "message must be 1-1000 characters"))]
    pub message: String,
}

impl ChatRequest {
    /// Trimmed copy, so whitespace-only messages fail validation.
    pub fn trimmed(&self) -> Self {
        Self {
            message: self.message.trim().to_string(),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl AssistantMessage {
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender: Sender::Bot,
            timestamp: Utc::now(),
        }
    }

    /// The assistant's answer to a user message.
    pub fn reply_to(input: &str) -> Self {
        Self::bot(reply_for(input))
    }
}
