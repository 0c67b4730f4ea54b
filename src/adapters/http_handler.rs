use std::{net::SocketAddr, sync::Arc};

use axum::{body::Body as AxumBody, response::IntoResponse};
use http_body_util::{BodyExt, Limited};
use hyper::{Request, Response};
use tracing::Instrument;

use crate::{
    core::{GatewayError, GatewayService, Outcome, RequestContext},
    ports::{
        auth_verifier::{AuthVerificationResult, AuthVerifier, bearer_credential},
        http_client::HttpClient,
    },
    tracing_setup::create_request_span,
};

/// Upper bound on how much of a failing backend body is read for the log.
const BACKEND_ERROR_BODY_LIMIT: usize = 8 * 1024;

/// Request dispatcher for the gateway.
///
/// Each request runs resolve → verify (when the route requires it) → rewrite →
/// forward, and every path through it ends in exactly one access-log record.
pub struct HttpHandler {
    gateway_service: Arc<GatewayService>,
    http_client: Arc<dyn HttpClient>,
    auth_verifier: Arc<dyn AuthVerifier>,
}

impl HttpHandler {
    pub fn new(
        gateway_service: Arc<GatewayService>,
        http_client: Arc<dyn HttpClient>,
        auth_verifier: Arc<dyn AuthVerifier>,
    ) -> Self {
        Self {
            gateway_service,
            http_client,
            auth_verifier,
        }
    }

    pub fn gateway_service(&self) -> &GatewayService {
        &self.gateway_service
    }

    /// Handle one inbound request. Failures become plain-text error responses,
    /// so this never returns an error to the server.
    pub async fn handle_request(
        &self,
        req: Request<AxumBody>,
        client_addr: Option<SocketAddr>,
    ) -> Response<AxumBody> {
        let mut ctx = RequestContext::new(&req, client_addr);
        let span = create_request_span(req.method().as_str(), req.uri().path(), ctx.track_id());

        async move {
            let (response, outcome) = match self.dispatch(req, &mut ctx).await {
                Ok(response) => (response, Outcome::Proxied),
                Err(err) => {
                    match &err {
                        GatewayError::RouteNotFound { .. } | GatewayError::MalformedPath(_) => {
                            tracing::debug!("Rejected request: {}", err)
                        }
                        GatewayError::AuthDenied => tracing::info!("Credential rejected"),
                        _ => tracing::warn!("Request failed: {}", err),
                    }
                    let outcome = err.outcome();
                    (err.into_response(), outcome)
                }
            };

            tracing::Span::current().record("http.status_code", response.status().as_u16());
            ctx.finish(response.status(), outcome);
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        req: Request<AxumBody>,
        ctx: &mut RequestContext,
    ) -> Result<Response<AxumBody>, GatewayError> {
        let matched = self
            .gateway_service
            .resolve(req.method(), req.uri().path())?;
        ctx.record_route(&matched);

        if matched.route.auth_required {
            let credential = bearer_credential(req.headers());
            let verdict = self.auth_verifier.verify(&credential).await;
            ctx.record_verification(&verdict);
            match verdict {
                AuthVerificationResult::Verified => {}
                AuthVerificationResult::Denied => return Err(GatewayError::AuthDenied),
                AuthVerificationResult::VerifierUnavailable { reason } => {
                    return Err(GatewayError::AuthUnavailable(reason));
                }
            }
        }

        let target = self.gateway_service.target_for(&matched.route)?;
        let outbound = self.gateway_service.rewriter().rewrite(
            req,
            target,
            &matched.target_path,
            ctx.track_id(),
            ctx.client_addr(),
        )?;

        tracing::debug!(
            "Forwarding {} {} to {}",
            outbound.method(),
            matched.route.proxy_path,
            outbound.uri()
        );

        let response = self.http_client.send_request(outbound).await?;

        if response.status().is_server_error() {
            let status = response.status();
            let body = match Limited::new(response.into_body(), BACKEND_ERROR_BODY_LIMIT)
                .collect()
                .await
            {
                Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
                Err(e) => format!("<unreadable body: {e}>"),
            };
            tracing::warn!(
                service = %matched.route.service_name,
                status = status.as_u16(),
                body = %body,
                "Backend returned a server error"
            );
            return Err(GatewayError::BackendError { status });
        }

        Ok(response)
    }
}
