//! Bearer token extraction.
//!
//! Tokens arrive in the `Authorization: Bearer …` header or, because browser
//! WebSocket clients cannot set headers, in the `auth` query parameter. When
//! authentication is enabled a token is required on every request; when
//! disabled the extractor yields `None` without looking at the request.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, AUTHORIZATION};
use axum::http::request::Parts;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::Claims;
use crate::error::ServerError;
use crate::state::AppState;

/// Verified claims, or `None` when authentication is disabled.
#[derive(Debug)]
pub struct MaybeBearer(pub Option<Claims>);

#[derive(Deserialize)]
struct AuthQuery {
    auth: Option<String>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeBearer {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !state.auth.enabled() {
            return Ok(MaybeBearer(None));
        }

        let token = extract_header_token(&parts.headers)
            .or_else(|| extract_query_token(parts.uri.query()))
            .ok_or_else(|| ServerError::unauthorized("bearer token required"))?;

        let claims = state.auth.verify(&token)?;
        Ok(MaybeBearer(Some(claims)))
    }
}

/// Extract a bearer token with HTTP-standard tolerance: case-insensitive
/// scheme, surrounding whitespace trimmed.
fn extract_header_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let auth_lower = auth.to_ascii_lowercase();
    if auth_lower.starts_with("bearer ") {
        Some(auth[7..].trim().to_string())
    } else {
        None
    }
}

fn extract_query_token(query: Option<&str>) -> Option<String> {
    let query = query?;
    serde_urlencoded::from_str::<AuthQuery>(query)
        .ok()
        .and_then(|q| q.auth)
}
