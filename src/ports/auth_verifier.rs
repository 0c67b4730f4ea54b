use async_trait::async_trait;
use hyper::{HeaderMap, header};

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of asking the auth service about a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthVerificationResult {
    /// The auth service accepted the credential.
    Verified,
    /// The auth service rejected the credential (`verified: false` or HTTP 401).
    Denied,
    /// The auth service could not be asked or gave an answer outside its contract.
    VerifierUnavailable { reason: String },
}

/// AuthVerifier defines the port for credential verification.
///
/// One call per request, no retries. Implementations must never panic or return
/// early with a default: every failure is reported as `VerifierUnavailable`.
#[async_trait]
pub trait AuthVerifier: Send + Sync + 'static {
    async fn verify(&self, credential: &str) -> AuthVerificationResult;
}

/// Extract the credential from the `Authorization` header.
///
/// A literal `Bearer ` prefix is stripped; an absent or non-UTF-8 header yields an
/// empty credential. The format is not validated here.
pub fn bearer_credential(headers: &HeaderMap) -> String {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).to_string()
}
