//! Document endpoints: GET, PUT, and DELETE at arbitrary paths.
//!
//! Writes are fire-and-acknowledge: the response is sent once the
//! modification is journaled and applied in memory, not after the next sync.

use crate::auth::AccessMode;
use crate::error::{Result, ServerError};
use crate::extract::MaybeBearer;
use crate::routes::ws;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path as UriPath, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use axum::Json;
use icepeak_store::{Modification, Path, Value};
use std::sync::Arc;
use tracing::debug;

/// GET on a document path: read once, or upgrade to a subscription.
pub async fn read(
    State(state): State<Arc<AppState>>,
    UriPath(path): UriPath<String>,
    bearer: MaybeBearer,
    upgrade: Option<WebSocketUpgrade>,
) -> Result<Response> {
    read_at(state, Path::from_uri(&path), bearer, upgrade).await
}

/// GET on the document root.
pub async fn read_root(
    State(state): State<Arc<AppState>>,
    bearer: MaybeBearer,
    upgrade: Option<WebSocketUpgrade>,
) -> Result<Response> {
    read_at(state, Path::root(), bearer, upgrade).await
}

async fn read_at(
    state: Arc<AppState>,
    path: Path,
    MaybeBearer(claims): MaybeBearer,
    upgrade: Option<WebSocketUpgrade>,
) -> Result<Response> {
    state.auth.authorize(&claims, &path, AccessMode::Read)?;

    if let Some(upgrade) = upgrade {
        debug!(%path, "websocket subscription requested");
        let subscription = state.store.subscribe(path).await?;
        return Ok(upgrade.on_upgrade(move |socket| ws::serve(socket, subscription)));
    }

    match state.store.get(&path) {
        Some(value) => Ok(Json(value).into_response()),
        None => Err(ServerError::not_found(format!("no value at /{path}"))),
    }
}

/// PUT on a document path.
pub async fn write(
    State(state): State<Arc<AppState>>,
    UriPath(path): UriPath<String>,
    bearer: MaybeBearer,
    body: Bytes,
) -> Result<Response> {
    write_at(state, Path::from_uri(&path), bearer, body).await
}

/// PUT on the document root.
pub async fn write_root(
    State(state): State<Arc<AppState>>,
    bearer: MaybeBearer,
    body: Bytes,
) -> Result<Response> {
    write_at(state, Path::root(), bearer, body).await
}

async fn write_at(
    state: Arc<AppState>,
    path: Path,
    MaybeBearer(claims): MaybeBearer,
    body: Bytes,
) -> Result<Response> {
    state.auth.authorize(&claims, &path, AccessMode::Write)?;

    let value: Value = serde_json::from_slice(&body)?;
    state.store.modify(Modification::put(path, value)).await?;
    Ok(Json(serde_json::json!({})).into_response())
}

/// DELETE on a document path.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    UriPath(path): UriPath<String>,
    bearer: MaybeBearer,
) -> Result<Response> {
    delete_at(state, Path::from_uri(&path), bearer).await
}

/// DELETE on the document root.
pub async fn delete_root(
    State(state): State<Arc<AppState>>,
    bearer: MaybeBearer,
) -> Result<Response> {
    delete_at(state, Path::root(), bearer).await
}

async fn delete_at(
    state: Arc<AppState>,
    path: Path,
    MaybeBearer(claims): MaybeBearer,
) -> Result<Response> {
    state.auth.authorize(&claims, &path, AccessMode::Write)?;

    state.store.modify(Modification::delete(path)).await?;
    Ok(Json(serde_json::json!({})).into_response())
}
