//! Per-request bookkeeping and the access log.
//!
//! A [`RequestContext`] is created when a request arrives, owned by that request's
//! task only, and consumed by [`RequestContext::finish`], which writes the single
//! access-log record for the request.
use std::{net::SocketAddr, sync::Arc, time::Instant};

use hyper::{HeaderMap, Method, Request, StatusCode, header};
use rand::{Rng, distr::Alphanumeric};

use crate::{
    core::route_table::{RouteDefinition, RouteMatch},
    ports::auth_verifier::AuthVerificationResult,
};

/// Correlation header propagated to backends.
pub const TRACK_ID_HEADER: &str = "x-track-id";

const TRACK_ID_LEN: usize = 12;

/// Random alphanumeric tracking id.
pub fn generate_track_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TRACK_ID_LEN)
        .map(char::from)
        .collect()
}

/// Caller supplied tracking id, if present and non-empty.
pub fn inbound_track_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TRACK_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Terminal state a request reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Proxied,
    NotFound,
    MalformedPath,
    Denied,
    AuthUnavailable,
    BackendFailed,
    BackendUnreachable,
    BackendTimeout,
    Internal,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Proxied => "proxied",
            Outcome::NotFound => "not_found",
            Outcome::MalformedPath => "malformed_path",
            Outcome::Denied => "denied",
            Outcome::AuthUnavailable => "auth_unavailable",
            Outcome::BackendFailed => "backend_failed",
            Outcome::BackendUnreachable => "backend_unreachable",
            Outcome::BackendTimeout => "backend_timeout",
            Outcome::Internal => "internal",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct RequestContext {
    track_id: String,
    started: Instant,
    client_addr: Option<SocketAddr>,
    user_agent: String,
    method: Method,
    path: String,
    route: Option<Arc<RouteDefinition>>,
    target_path: Option<String>,
    verification: Option<AuthVerificationResult>,
}

impl RequestContext {
    pub fn new<B>(req: &Request<B>, client_addr: Option<SocketAddr>) -> Self {
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self {
            track_id: inbound_track_id(req.headers()).unwrap_or_else(generate_track_id),
            started: Instant::now(),
            client_addr,
            user_agent,
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            route: None,
            target_path: None,
            verification: None,
        }
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr
    }

    pub fn record_route(&mut self, matched: &RouteMatch) {
        self.route = Some(matched.route.clone());
        self.target_path = Some(matched.target_path.clone());
    }

    pub fn record_verification(&mut self, result: &AuthVerificationResult) {
        self.verification = Some(result.clone());
    }

    /// Emit the access-log record. Consumes the context so it can only happen once.
    pub fn finish(self, status: StatusCode, outcome: Outcome) {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let remote_addr = self
            .client_addr
            .map(|addr| addr.to_string())
            .unwrap_or_default();
        let (proxy_path, service) = match &self.route {
            Some(route) => (route.proxy_path.as_str(), route.service_name.as_str()),
            None => ("", ""),
        };
        let auth = match &self.verification {
            None => "skipped",
            Some(AuthVerificationResult::Verified) => "verified",
            Some(AuthVerificationResult::Denied) => "denied",
            Some(AuthVerificationResult::VerifierUnavailable { .. }) => "unavailable",
        };

        tracing::info!(
            track_id = %self.track_id,
            remote_addr = %remote_addr,
            user_agent = %self.user_agent,
            method = %self.method,
            path = %self.path,
            proxy_path = %proxy_path,
            service = %service,
            target_path = %self.target_path.as_deref().unwrap_or_default(),
            auth = auth,
            status = status.as_u16(),
            outcome = %outcome,
            duration_ms = duration_ms,
            "request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body as AxumBody;
    use hyper::header::HeaderValue;

    use super::*;

    #[test]
    fn test_generated_track_id_shape() {
        let id = generate_track_id();
        assert_eq!(id.len(), TRACK_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_track_id());
    }

    #[test]
    fn test_caller_track_id_is_kept() {
        let req = Request::builder()
            .uri("/x")
            .header(TRACK_ID_HEADER, "caller-id-1")
            .body(AxumBody::empty())
            .unwrap();
        let ctx = RequestContext::new(&req, None);
        assert_eq!(ctx.track_id(), "caller-id-1");
    }

    #[test]
    fn test_empty_track_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACK_ID_HEADER, HeaderValue::from_static(""));
        assert!(inbound_track_id(&headers).is_none());

        let req = Request::builder()
            .uri("/x")
            .header(TRACK_ID_HEADER, "")
            .body(AxumBody::empty())
            .unwrap();
        assert_eq!(RequestContext::new(&req, None).track_id().len(), TRACK_ID_LEN);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Proxied.to_string(), "proxied");
        assert_eq!(Outcome::AuthUnavailable.as_str(), "auth_unavailable");
    }
}
