//! HTTP route handlers and router configuration.
//!
//! The main router serves the document itself: every path is a document
//! location, so GET/PUT/DELETE are mounted on a catch-all route (plus the
//! bare root). A GET carrying a WebSocket upgrade opens a subscription
//! instead of reading once. Health and metrics live on the separate metrics
//! listener so they cannot shadow document keys.

mod admin;
mod data;
mod ws;

use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the main application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/",
            get(data::read_root)
                .put(data::write_root)
                .delete(data::delete_root),
        )
        .route(
            "/*path",
            get(data::read).put(data::write).delete(data::delete),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Build the router for the metrics listener.
pub fn build_metrics_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(admin::health))
        .route("/metrics", get(admin::metrics))
        .with_state(state)
}
