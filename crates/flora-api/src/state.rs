//! Application state.

use std::sync::Arc;

use flora_ml_client::{MlClient, MlClientConfig, MlResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub ml: Arc<MlClient>,
}

impl AppState {
    /// Create application state from explicit configs.
    pub fn new(config: ApiConfig, ml_config: MlClientConfig) -> MlResult<Self> {
        let ml = MlClient::new(ml_config)?;
        Ok(Self {
            config,
            ml: Arc::new(ml),
        })
    }

    /// Create application state from environment variables.
    pub fn from_env(config: ApiConfig) -> MlResult<Self> {
        Self::new(config, MlClientConfig::from_env())
    }
}
