use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, Request, State},
    response::Response,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::{adapters::HttpHandler, core::HEALTH_PATH};

/// Assemble the public router: the health endpoint plus a fallback that hands
/// every other request to the dispatcher.
///
/// Only `GET` (and the implied `HEAD`) on the health path bypasses routing; any
/// other method there is dispatched like a normal request.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// client address reaches `X-Forwarded-For` and the access log.
pub fn build_router(handler: Arc<HttpHandler>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health).fallback(forward))
        .fallback(forward)
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn health() -> &'static str {
    "OK"
}

async fn forward(State(handler): State<Arc<HttpHandler>>, req: Request) -> Response<Body> {
    let client_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    handler.handle_request(req, client_addr).await
}
