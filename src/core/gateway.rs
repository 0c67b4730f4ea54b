//! Core gateway state.
//!
//! The `GatewayService` aggregates the immutable configuration (`GatewayConfig`)
//! with everything derived from it at startup:
//! * the finalized route table
//! * the service registry
//! * the outbound request rewriter
//! * the resolved auth-service verification URL
//!
//! Construction is where every configuration invariant is enforced: a route that
//! names an unknown service, a duplicate route or an unsupported scheme makes
//! [`GatewayService::new`] fail, so nothing of the sort can surface at request
//! time. This layer performs no I/O.
use std::sync::Arc;

use hyper::Method;

use crate::{
    config::{GatewayConfig, ServiceTarget},
    core::{
        error::{ConfigError, GatewayError},
        registry::ServiceRegistry,
        rewrite::RequestRewriter,
        route_table::{RouteDefinition, RouteMatch, RouteTable},
    },
};

/// Always-present liveness endpoint, answered before any routing.
pub const HEALTH_PATH: &str = "/api/health";

/// Read-only routing state shared by every request task.
///
/// Construct with [`GatewayService::new`] by passing an `Arc<GatewayConfig>`.
pub struct GatewayService {
    config: Arc<GatewayConfig>,
    routes: RouteTable,
    registry: ServiceRegistry,
    rewriter: RequestRewriter,
    auth_verify_url: String,
}

impl GatewayService {
    pub fn new(config: Arc<GatewayConfig>) -> Result<Self, ConfigError> {
        let registry = ServiceRegistry::new(config.services.clone())?;
        let routes = RouteTable::from_entries(&config.routes)?;

        for route in routes.iter() {
            if !registry.contains(&route.service_name) {
                return Err(ConfigError::UnknownService {
                    method: route.method.to_string(),
                    path: route.proxy_path.clone(),
                    service: route.service_name.clone(),
                });
            }
        }

        let auth_target = registry
            .lookup(&config.auth.service)
            .ok_or_else(|| ConfigError::UnknownAuthService(config.auth.service.clone()))?;

        let rewriter = RequestRewriter::new(&config.upstream_scheme, &config.app_url())?;
        let auth_verify_url = format!(
            "{}://{}{}",
            rewriter.scheme(),
            auth_target.authority(),
            config.auth.verify_path
        );

        Ok(Self {
            config,
            routes,
            registry,
            rewriter,
            auth_verify_url,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn rewriter(&self) -> &RequestRewriter {
        &self.rewriter
    }

    /// Full URL of the auth service verification endpoint.
    pub fn auth_verify_url(&self) -> &str {
        &self.auth_verify_url
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch, GatewayError> {
        self.routes.resolve(method, path)
    }

    /// Backend of a resolved route. Every route's service was checked at
    /// construction, so a miss means the route did not come from this table.
    pub fn target_for(&self, route: &RouteDefinition) -> Result<&ServiceTarget, GatewayError> {
        self.registry.lookup(&route.service_name).ok_or_else(|| {
            GatewayError::Internal(format!("service '{}' is not registered", route.service_name))
        })
    }
}
