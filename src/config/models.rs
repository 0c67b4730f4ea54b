//! Configuration data structures for Wicket.
//!
//! These types map directly to YAML (also JSON / TOML) configuration files. They are
//! serde‑friendly and carry defaults so that a minimal config only has to list the
//! auth service, the service registry and the routes.
use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

/// Path of the verification endpoint on the auth service unless configured otherwise.
pub const DEFAULT_VERIFY_PATH: &str = "/verify";

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_upstream_scheme() -> String {
    "http".to_string()
}

fn default_backend_timeout() -> String {
    "30s".to_string()
}

fn default_verify_path() -> String {
    DEFAULT_VERIFY_PATH.to_string()
}

fn default_auth_timeout() -> String {
    "5s".to_string()
}

fn default_auth_required() -> bool {
    true
}

/// Top level gateway configuration.
///
/// `app_host`, `app_port` and `environment` can be overridden by the `APP_HOST`,
/// `APP_PORT` and `ENV` environment variables (see [`crate::config::loader`]).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_app_host")]
    pub app_host: String,
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    /// Deployment environment; selects log format and verbosity.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Scheme used for every outbound call (backends and auth service).
    #[serde(default = "default_upstream_scheme")]
    pub upstream_scheme: String,
    /// Upper bound on waiting for backend response headers, e.g. "30s".
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout: String,
    pub auth: AuthServiceConfig,
    #[serde(default)]
    pub services: HashMap<String, ServiceTarget>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl GatewayConfig {
    /// Create a new gateway configuration builder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// The `host:port` the gateway listens on and advertises to backends.
    pub fn app_url(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    /// Development environments get human readable logs instead of JSON lines.
    pub fn is_development(&self) -> bool {
        matches!(
            self.environment.to_ascii_lowercase().as_str(),
            "development" | "dev" | "local"
        )
    }

    pub fn backend_timeout_duration(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.backend_timeout)
    }
}

/// Where and how to reach the authentication service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthServiceConfig {
    /// Name of the auth service in the `services` registry.
    pub service: String,
    #[serde(default = "default_verify_path")]
    pub verify_path: String,
    /// Upper bound on a single verification call, e.g. "5s".
    #[serde(default = "default_auth_timeout")]
    pub timeout: String,
}

impl AuthServiceConfig {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            verify_path: default_verify_path(),
            timeout: default_auth_timeout(),
        }
    }

    pub fn timeout_duration(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.timeout)
    }
}

/// Network location of a backend service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub host: String,
    pub port: u16,
}

impl ServiceTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, as used in outbound URIs and the `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One HTTP method or a list of methods sharing the same route.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MethodSpec {
    One(String),
    Many(Vec<String>),
}

impl MethodSpec {
    pub fn methods(&self) -> Vec<&str> {
        match self {
            MethodSpec::One(method) => vec![method.as_str()],
            MethodSpec::Many(methods) => methods.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for MethodSpec {
    fn from(method: &str) -> Self {
        MethodSpec::One(method.to_string())
    }
}

/// A route as written in the configuration file.
///
/// `proxy_path` may end in `/*`, in which case everything after the prefix is
/// captured. `actual_path` set to `*` forwards that captured remainder as is,
/// `actual_path` ending in `/*` appends it to the given prefix.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub proxy_path: String,
    #[serde(alias = "service")]
    pub service_name: String,
    pub actual_path: String,
    pub method: MethodSpec,
    #[serde(default = "default_auth_required")]
    pub auth_required: bool,
}

impl RouteEntry {
    /// An auth-protected route; chain [`RouteEntry::public`] to skip verification.
    pub fn new(
        method: impl Into<MethodSpec>,
        proxy_path: impl Into<String>,
        service_name: impl Into<String>,
        actual_path: impl Into<String>,
    ) -> Self {
        Self {
            proxy_path: proxy_path.into(),
            service_name: service_name.into(),
            actual_path: actual_path.into(),
            method: method.into(),
            auth_required: true,
        }
    }

    pub fn public(mut self) -> Self {
        self.auth_required = false;
        self
    }
}

/// Builder for GatewayConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct GatewayConfigBuilder {
    app_host: Option<String>,
    app_port: Option<u16>,
    environment: Option<String>,
    upstream_scheme: Option<String>,
    backend_timeout: Option<String>,
    auth: Option<AuthServiceConfig>,
    services: HashMap<String, ServiceTarget>,
    routes: Vec<RouteEntry>,
}

impl GatewayConfigBuilder {
    pub fn app_host(mut self, host: impl Into<String>) -> Self {
        self.app_host = Some(host.into());
        self
    }

    pub fn app_port(mut self, port: u16) -> Self {
        self.app_port = Some(port);
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn upstream_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.upstream_scheme = Some(scheme.into());
        self
    }

    pub fn backend_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.backend_timeout = Some(timeout.into());
        self
    }

    /// Name the registry entry that answers verification calls.
    pub fn auth_service(mut self, service: impl Into<String>) -> Self {
        self.auth = Some(AuthServiceConfig::new(service));
        self
    }

    pub fn auth(mut self, auth: AuthServiceConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Register a backend under a logical name
    pub fn service(mut self, name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        self.services
            .insert(name.into(), ServiceTarget::new(host, port));
        self
    }

    pub fn route(mut self, route: RouteEntry) -> Self {
        self.routes.push(route);
        self
    }

    /// Build the final GatewayConfig
    pub fn build(self) -> Result<GatewayConfig, String> {
        let auth = self
            .auth
            .ok_or_else(|| "auth service is required".to_string())?;

        Ok(GatewayConfig {
            app_host: self.app_host.unwrap_or_else(default_app_host),
            app_port: self.app_port.unwrap_or_else(default_app_port),
            environment: self.environment.unwrap_or_else(default_environment),
            upstream_scheme: self.upstream_scheme.unwrap_or_else(default_upstream_scheme),
            backend_timeout: self.backend_timeout.unwrap_or_else(default_backend_timeout),
            auth,
            services: self.services,
            routes: self.routes,
        })
    }
}
