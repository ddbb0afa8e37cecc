//! Axum HTTP gateway for the Flora plant-care app.
//!
//! This crate provides:
//! - Leaf image disease detection proxied to a hosted classifier
//! - Crop recommendation proxied to a hosted recommender
//! - A keyword-driven plant assistant
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
