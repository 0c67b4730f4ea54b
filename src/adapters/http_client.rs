use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response, Version, header};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::time::timeout;
use tracing::Instrument;

use crate::{
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult},
    tracing_setup::create_backend_span,
};

/// HTTP client adapter forwarding requests to backends over plain HTTP/1.1.
///
/// Responsibilities:
/// * Pooled keep-alive connections shared by every request task
/// * Bounded wait for response headers (`timeout`)
/// * Streaming request and response bodies (nothing is buffered)
/// * Converting between Hyper body and Axum body types
///
/// Retries and circuit breaking are deliberately absent: one failed attempt is
/// final for the request.
pub struct HttpClientAdapter {
    client: Client<HttpConnector, AxumBody>,
    timeout: Duration,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut http_connector = HttpConnector::new();
        http_connector.set_nodelay(true);

        // Create client with TokioExecutor for async runtime
        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(http_connector);

        tracing::info!("Created backend HTTP client (timeout {:?})", timeout);
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>> {
        if req.uri().host().is_none() {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        }

        // Extract backend information for logging
        let backend_identifier = format!(
            "{}://{}",
            req.uri().scheme_str().unwrap_or("http"),
            req.uri()
                .authority()
                .map_or_else(|| "unknown".to_string(), |a| a.to_string())
        );
        let span = create_backend_span(
            &backend_identifier,
            req.method().as_str(),
            req.uri().path(),
        );

        let (mut parts, axum_body) = req.into_parts();
        parts.version = Version::HTTP_11;

        tracing::debug!("Sending request: {} {}", parts.method, parts.uri);

        let outgoing_request = Request::from_parts(parts, axum_body);
        let method_for_error_log = outgoing_request.method().clone();
        let uri_for_error_log = outgoing_request.uri().clone();

        let result = timeout(self.timeout, self.client.request(outgoing_request))
            .instrument(span.clone())
            .await;

        match result {
            Ok(Ok(response)) => {
                span.record("http.status_code", response.status().as_u16());

                let (mut parts, hyper_body) = response.into_parts();

                // Remove Transfer-Encoding header since the body is being decoded/streamed
                // and the downstream server (Axum) will handle framing.
                parts.headers.remove(header::TRANSFER_ENCODING);

                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Ok(Err(e)) => {
                span.record("http.status_code", 599u16);
                tracing::error!(
                    "Error making request to backend {} ({} {}): {}",
                    backend_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    e
                );

                Err(HttpClientError::ConnectionError(format!(
                    "Request to {method_for_error_log} {uri_for_error_log} failed: {e}"
                )))
            }
            Err(_) => {
                tracing::warn!(
                    "Backend {} did not respond to {} {} within {:?}",
                    backend_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    self.timeout
                );
                Err(HttpClientError::Timeout(self.timeout))
            }
        }
    }
}
