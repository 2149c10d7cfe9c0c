//! Application state for the wx API.

use std::sync::Arc;

use storage::WeatherStore;

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Read access to locations and reports
    pub store: Arc<dyn WeatherStore>,

    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn WeatherStore>, config: ServerConfig) -> Self {
        Self { store, config }
    }
}
