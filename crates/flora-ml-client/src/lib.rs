//! Client for the hosted inference services.
//!
//! Two external services sit behind the gateway:
//! - a plant disease image classifier, called with a base64 data URL
//! - a crop recommender, whose endpoint path is either configured or
//!   discovered by trying a fixed list of candidates in order

pub mod client;
pub mod error;
pub mod types;

pub use client::{MlClient, MlClientConfig, CROP_CANDIDATE_PATHS, DEFAULT_CROP_BASE_URL, DEFAULT_DISEASE_URL};
pub use error::{MlError, MlResult};
pub use types::{CropRecommendation, EndpointAttempt, PredictRequest};
