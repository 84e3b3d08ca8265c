//! Icepeak HTTP/WebSocket server.
//!
//! A thin driver around `icepeak-store`: HTTP GET/PUT/DELETE at arbitrary
//! document paths, WebSocket subscriptions on the same paths, bearer-token
//! authorization, and a Prometheus metrics listener.
//!
//! # Example
//!
//! ```ignore
//! use icepeak_server::{IcepeakServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let server = IcepeakServer::new(config).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;
pub use telemetry::init_logging;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Icepeak server: shared state plus the configured router.
pub struct IcepeakServer {
    state: Arc<AppState>,
    router: Router,
}

impl IcepeakServer {
    /// Create a new server: validates the configuration, loads the persisted
    /// document, and spawns the store writer.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let state = Arc::new(AppState::new(config)?);
        let router = routes::build_router(state.clone());
        Ok(IcepeakServer { state, router })
    }

    /// Get a reference to the application state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get the router for testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until interrupted, then shut the store down cleanly.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.state.config.listen_addr).await?;

        let sync_timer = self
            .state
            .store
            .spawn_sync_timer(Duration::from_secs(self.state.config.sync_interval));

        let metrics_task = match self.state.config.metrics_addr {
            Some(addr) => {
                let router = routes::build_metrics_router(self.state.clone());
                let metrics_listener = TcpListener::bind(addr).await?;
                info!(addr = %addr, "metrics listener started");
                Some(tokio::spawn(async move {
                    if let Err(e) = axum::serve(metrics_listener, router).await {
                        error!(error = %e, "metrics listener failed");
                    }
                }))
            }
            None => None,
        };

        info!(
            addr = %self.state.config.listen_addr,
            data_file = %self.state.config.data_file.display(),
            journaling = self.state.config.journaling_enabled(),
            auth = self.state.config.auth_enabled(),
            sync_interval_secs = self.state.config.sync_interval,
            "icepeak server starting"
        );

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        sync_timer.abort();
        if let Some(task) = metrics_task {
            task.abort();
        }

        // Final sync, journal close, subscriber disconnect.
        if let Err(e) = self.state.store.shutdown().await {
            error!(error = %e, "store shutdown failed");
        }

        result
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received, draining");
}
