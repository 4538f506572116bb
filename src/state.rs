//! Shared application state passed to every handler.

use std::sync::Arc;

use crate::config::ServerConfig;

/// Application state shared across routes.
///
/// Holds the immutable server configuration and the HTTP client used for
/// tool invocations. Each session relay gets its configuration from here
/// explicitly - there is no ambient mutable state.
pub struct AppState {
    /// Server configuration loaded at startup
    pub config: ServerConfig,
    /// Shared HTTP client for the domain lookup service
    pub http: reqwest::Client,
}

impl AppState {
    /// Create the shared application state.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            http: reqwest::Client::new(),
            config,
        })
    }
}
