//! Shared-secret guard for internal-only endpoints.
//!
//! The dispatch and revenue surfaces are called by trusted upstream
//! automation, never by end users. Callers prove themselves with a shared
//! secret in a request header; comparison is constant-time.

use crate::config::InternalAuthConfig;
use crate::error::CoachwayError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Middleware state: the header name and the expected secret.
#[derive(Clone)]
pub struct InternalAuth {
    header: String,
    secret: Arc<SecretString>,
}

impl InternalAuth {
    #[must_use]
    pub fn from_config(config: &InternalAuthConfig) -> Self {
        Self {
            header: config.header.clone(),
            secret: Arc::new(SecretString::new(config.secret.clone())),
        }
    }

    fn verify(&self, presented: &str) -> bool {
        let expected = self.secret.expose_secret();
        // An unconfigured (empty) secret admits nobody.
        !expected.is_empty() && constant_time_eq(presented.as_bytes(), expected.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Reject requests without a valid internal secret. Missing header is a
/// 401, a wrong secret is a 403.
pub async fn require_internal_secret(
    State(auth): State<InternalAuth>,
    request: Request,
    next: Next,
) -> Result<Response, CoachwayError> {
    let presented = request
        .headers()
        .get(&auth.header)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            CoachwayError::unauthorized(format!("Missing {} header", auth.header))
        })?;

    if !auth.verify(presented) {
        return Err(CoachwayError::forbidden("Invalid internal secret"));
    }

    Ok(next.run(request).await)
}
