//! Bearer-token authorization.
//!
//! Tokens are HS256 JWTs signed with the server's shared secret. The claims
//! carry a whitelist of path prefixes, each granting read and/or write
//! access to everything at or under that prefix:
//!
//! ```json
//! {"version": 1, "whitelist": {"a/b": ["read", "write"]}, "exp": 1700000000}
//! ```
//!
//! An empty-string whitelist key grants the mode on the whole document. When
//! no secret is configured, authentication is disabled and every request is
//! allowed.

use crate::error::ServerError;
use icepeak_store::Path;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version of the claims format this server understands.
pub const CLAIMS_VERSION: u32 = 1;

/// Access mode required for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// GET and WebSocket subscriptions
    Read,
    /// PUT and DELETE
    Write,
}

/// Icepeak token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Claims format version; must equal [`CLAIMS_VERSION`]
    pub version: u32,

    /// Path prefixes (`/`-joined, empty string for the root) mapped to the
    /// modes they grant
    #[serde(default)]
    pub whitelist: HashMap<String, Vec<AccessMode>>,

    /// Expiry as seconds since the Unix epoch (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl Claims {
    /// Whether the claims grant `mode` at `path`.
    ///
    /// True when some whitelisted prefix carrying the mode is a prefix of
    /// the requested path.
    pub fn allows(&self, path: &Path, mode: AccessMode) -> bool {
        self.whitelist
            .iter()
            .any(|(prefix, modes)| modes.contains(&mode) && Path::from_uri(prefix).is_prefix_of(path))
    }
}

/// Verifier plus enablement flag, shared across handlers.
pub struct AuthContext {
    verifier: Option<TokenVerifier>,
}

impl AuthContext {
    /// Build from the configured secret; `None` disables authentication.
    pub fn new(secret: Option<&str>) -> Self {
        AuthContext {
            verifier: secret.map(TokenVerifier::new),
        }
    }

    /// Whether authentication is enabled.
    pub fn enabled(&self) -> bool {
        self.verifier.is_some()
    }

    /// Verify a raw token string into claims.
    pub fn verify(&self, token: &str) -> Result<Claims, ServerError> {
        match &self.verifier {
            Some(verifier) => verifier.verify(token),
            None => Err(ServerError::unauthorized(
                "authentication is not enabled on this server",
            )),
        }
    }

    /// Check that the request may perform `mode` at `path`.
    ///
    /// `claims` is `None` when authentication is disabled (the extractor
    /// never produces `None` otherwise).
    pub fn authorize(
        &self,
        claims: &Option<Claims>,
        path: &Path,
        mode: AccessMode,
    ) -> Result<(), ServerError> {
        match (self.enabled(), claims) {
            (false, _) => Ok(()),
            (true, Some(claims)) if claims.allows(path, mode) => Ok(()),
            (true, _) => Err(ServerError::unauthorized(format!(
                "token does not grant {} access to /{}",
                match mode {
                    AccessMode::Read => "read",
                    AccessMode::Write => "write",
                },
                path
            ))),
        }
    }
}

/// HS256 token verifier.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from the shared secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is optional in icepeak claims; validated when present.
        validation.required_spec_claims.clear();
        TokenVerifier {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, ServerError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| ServerError::unauthorized(format!("invalid token: {e}")))?;
        if data.claims.version != CLAIMS_VERSION {
            return Err(ServerError::unauthorized(format!(
                "unsupported claims version {}",
                data.claims.version
            )));
        }
        Ok(data.claims)
    }
}
