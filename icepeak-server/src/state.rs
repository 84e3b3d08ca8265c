//! Application state shared across request handlers.

use crate::auth::AuthContext;
use crate::config::ServerConfig;
use crate::error::ServerError;
use icepeak_store::{Store, StoreHandle, StoreMetrics};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Instant;

/// State shared across all request handlers via `Arc<AppState>`.
pub struct AppState {
    /// Handle to the store coordinator
    pub store: StoreHandle,

    /// Server configuration
    pub config: ServerConfig,

    /// Bearer-token verification context
    pub auth: AuthContext,

    /// Metrics registry backing the metrics endpoint
    pub registry: Arc<Registry>,

    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Validate the configuration, load the persisted document, and spawn
    /// the store writer.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let mut registry = Registry::default();
        let metrics = Arc::new(StoreMetrics::new(&mut registry));
        let store = Store::spawn(config.store_config(), metrics)?;
        let auth = AuthContext::new(config.jwt_secret.as_deref());

        Ok(AppState {
            store,
            config,
            auth,
            registry: Arc::new(registry),
            start_time: Instant::now(),
        })
    }

    /// Server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
