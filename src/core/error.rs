//! Error taxonomy of the gateway core.
//!
//! [`ConfigError`] covers everything that is detected while building the route
//! table and service registry; it is fatal at startup. [`GatewayError`] covers
//! per-request failures and knows how to turn itself into the response the caller
//! sees. Internal detail carried by a variant is for logs only and never reaches
//! the response body.
use std::time::Duration;

use axum::{
    body::Body as AxumBody,
    response::{IntoResponse, Response},
};
use hyper::{StatusCode, header};
use thiserror::Error;

use crate::{core::context::Outcome, ports::http_client::HttpClientError};

/// Configuration problems found while building the gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("duplicate route: {method} {path}")]
    DuplicateRoute { method: String, path: String },

    #[error("route {method} {path} references unknown service '{service}'")]
    UnknownService {
        method: String,
        path: String,
        service: String,
    },

    #[error("auth service '{0}' is not registered")]
    UnknownAuthService(String),

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unsupported HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("unsupported upstream scheme '{0}', only http is supported")]
    UnsupportedScheme(String),

    #[error("invalid upstream address '{0}'")]
    InvalidAddress(String),
}

/// Per-request failures, each mapped to a fixed status and body.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("malformed request path: {0}")]
    MalformedPath(String),

    #[error("credential rejected by auth service")]
    AuthDenied,

    #[error("auth service unavailable: {0}")]
    AuthUnavailable(String),

    #[error("backend responded with {status}")]
    BackendError { status: StatusCode },

    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("backend did not respond within {0:?}")]
    BackendTimeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::MalformedPath(_) => StatusCode::BAD_REQUEST,
            GatewayError::AuthDenied => StatusCode::UNAUTHORIZED,
            GatewayError::AuthUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BackendError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BackendUnreachable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The body returned to the caller: the canonical reason phrase of the status.
    pub fn public_message(&self) -> &'static str {
        self.status_code()
            .canonical_reason()
            .unwrap_or("Internal Server Error")
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            GatewayError::RouteNotFound { .. } => Outcome::NotFound,
            GatewayError::MalformedPath(_) => Outcome::MalformedPath,
            GatewayError::AuthDenied => Outcome::Denied,
            GatewayError::AuthUnavailable(_) => Outcome::AuthUnavailable,
            GatewayError::BackendError { .. } => Outcome::BackendFailed,
            GatewayError::BackendUnreachable(_) => Outcome::BackendUnreachable,
            GatewayError::BackendTimeout(_) => Outcome::BackendTimeout,
            GatewayError::Internal(_) => Outcome::Internal,
        }
    }
}

impl From<HttpClientError> for GatewayError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::Timeout(after) => GatewayError::BackendTimeout(after),
            HttpClientError::ConnectionError(msg) => GatewayError::BackendUnreachable(msg),
            HttpClientError::InvalidRequest(msg) => GatewayError::Internal(msg),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = self.public_message();
        Response::builder()
            .status(self.status_code())
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::CONTENT_LENGTH, body.len().to_string())
            .body(AxumBody::from(body))
            .unwrap_or_else(|_| Response::new(AxumBody::from(body)))
    }
}
