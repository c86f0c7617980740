use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::domain::CredentialVerifier;
use crate::errors::AppError;

/// A fixed set of shared secrets, compared against the raw `Authorization` header.
#[derive(Clone)]
pub struct StaticApiKeys {
    keys: Vec<String>,
}

impl StaticApiKeys {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }
}

impl std::fmt::Debug for StaticApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticApiKeys")
            .field("count", &self.keys.len())
            .finish()
    }
}

impl CredentialVerifier for StaticApiKeys {
    fn verify(&self, token: &str) -> bool {
        !token.is_empty() && self.keys.iter().any(|key| constant_time_eq(key.as_bytes(), token.as_bytes()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Rejects requests whose `Authorization` header is missing or not accepted by
/// the verifier.
pub async fn require_api_key(
    State(verifier): State<Arc<dyn CredentialVerifier>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verifier.verify(token) {
        tracing::warn!(method = %request.method(), uri = %request.uri(), "Rejected request with invalid API key");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
