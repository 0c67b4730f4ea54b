use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::ports::auth_verifier::{AuthVerificationResult, AuthVerifier};

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    jwt: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verified: bool,
}

/// Asks the auth service whether a credential is valid.
///
/// One `POST {"jwt": ...}` per call with a bounded timeout. The verdict comes
/// from the `verified` field of a 200 response; a 401 is a denial; anything
/// else means the verifier is unavailable.
pub struct HttpAuthVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl HttpAuthVerifier {
    pub fn new(verify_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .wrap_err("Failed to build auth service client")?;
        let verify_url = verify_url.into();

        tracing::info!("Auth verification via {} (timeout {:?})", verify_url, timeout);
        Ok(Self { client, verify_url })
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }
}

#[async_trait]
impl AuthVerifier for HttpAuthVerifier {
    async fn verify(&self, credential: &str) -> AuthVerificationResult {
        let response = match self
            .client
            .post(&self.verify_url)
            .json(&VerifyRequest { jwt: credential })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!("auth service timed out: {e}")
                } else {
                    format!("auth service unreachable: {e}")
                };
                tracing::error!("{}", reason);
                return AuthVerificationResult::VerifierUnavailable { reason };
            }
        };

        match response.status() {
            StatusCode::OK => match response.json::<VerifyResponse>().await {
                Ok(VerifyResponse { verified: true }) => AuthVerificationResult::Verified,
                Ok(VerifyResponse { verified: false }) => AuthVerificationResult::Denied,
                Err(e) => {
                    tracing::error!("Unparseable auth service response: {}", e);
                    AuthVerificationResult::VerifierUnavailable {
                        reason: format!("malformed verification response: {e}"),
                    }
                }
            },
            StatusCode::UNAUTHORIZED => AuthVerificationResult::Denied,
            status => {
                tracing::warn!("Auth service answered with unexpected status {}", status);
                AuthVerificationResult::VerifierUnavailable {
                    reason: format!("auth service returned {status}"),
                }
            }
        }
    }
}
