//! Wicket - an auth-gated reverse-proxy API gateway.
//!
//! Wicket sits in front of a set of internal HTTP services. Every inbound request is
//! matched against a static route table, optionally checked against an external auth
//! service, rewritten toward its backend and streamed through. The route table is
//! built once at startup and never changes while the process runs.
//!
//! # Features
//! - Exact `(method, path)` routes plus `/*` prefix routes (longest prefix wins)
//! - Per-route authentication via a `POST {"jwt": ...}` call-out to an auth service
//! - Forwarding headers (`X-Forwarded-Host`, `X-Origin-Host`, `X-Forwarded-For`)
//!   and a propagated `X-Track-ID`
//! - Backend 5xx responses masked as a plain `500 Internal Server Error`
//! - One structured access-log record per request via `tracing`
//! - YAML / JSON / TOML configuration with `APP_HOST`, `APP_PORT` and `ENV` overrides
//! - Graceful shutdown on SIGINT / SIGTERM
//!
//! # Quick Example
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use wicket::{GatewayService, HttpAuthVerifier, HttpClientAdapter, HttpHandler, build_router};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let cfg = wicket::config::load_config("gateway.yaml").await?;
//! let gateway = Arc::new(GatewayService::new(Arc::new(cfg))?);
//! let verifier = HttpAuthVerifier::new(gateway.auth_verify_url(), Duration::from_secs(5))?;
//! let handler = HttpHandler::new(
//!     gateway,
//!     Arc::new(HttpClientAdapter::new(Duration::from_secs(30))?),
//!     Arc::new(verifier),
//! );
//! let app = build_router(Arc::new(handler));
//! # let _ = app;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! routing, rewriting and error mapping inside `core`, which performs no I/O.
//!
//! # Error Handling
//! Startup paths return `eyre::Result<T>` with context attached through `WrapErr`.
//! Request paths use the typed [`core::GatewayError`], which knows its own status code.

pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HttpAuthVerifier, HttpClientAdapter, HttpHandler, build_router},
    core::GatewayService,
    ports::{auth_verifier::AuthVerifier, http_client::HttpClient},
    utils::GracefulShutdown,
};
