//! Static route table and path matcher.
//!
//! The table is built once from configuration and never mutated afterwards, so it
//! can be shared across request tasks behind an `Arc` without synchronization.
//!
//! Matching rules:
//! * Exact `(method, path)` lookups are tried first.
//! * A `proxy_path` ending in `/*` matches its fixed prefix and anything below it.
//!   When several wildcard routes match, the longest prefix wins.
//! * Methods are compared case-sensitively; a path registered under another method
//!   does not match.
use std::{collections::HashMap, sync::Arc};

use hyper::Method;

use crate::{
    config::RouteEntry,
    core::error::{ConfigError, GatewayError},
};

/// Marker for "the rest of the path" in both `proxy_path` and `actual_path`.
pub const WILDCARD: &str = "*";

const WILDCARD_SEGMENT: &str = "/*";

const STANDARD_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// Parse one of the standard HTTP verbs. Lowercase or unknown verbs are rejected.
pub fn parse_method(raw: &str) -> Result<Method, ConfigError> {
    STANDARD_METHODS
        .iter()
        .find(|method| method.as_str() == raw)
        .cloned()
        .ok_or_else(|| ConfigError::InvalidMethod(raw.to_string()))
}

/// Compiled form of a `proxy_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    Exact(String),
    /// Fixed prefix without the trailing `/*`; empty for a catch-all `/*`.
    Prefix(String),
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let (fixed, is_wildcard) = match raw.strip_suffix(WILDCARD_SEGMENT) {
            Some(prefix) => (prefix, true),
            None => (raw, false),
        };

        if fixed.contains(WILDCARD) {
            return Err(invalid("'*' is only allowed as the final '/*' segment"));
        }
        if is_dot_segment_path(fixed) {
            return Err(invalid("'.' and '..' segments are not allowed"));
        }

        if is_wildcard {
            Ok(RoutePattern::Prefix(fixed.to_string()))
        } else {
            Ok(RoutePattern::Exact(fixed.to_string()))
        }
    }

    /// Returns the captured remainder when `path` falls under a prefix pattern.
    ///
    /// The remainder is either empty or starts with `/`, so `/files/*` matches
    /// `/files` and `/files/a` but not `/filesystem`.
    fn capture<'a>(&self, path: &'a str) -> Option<&'a str> {
        match self {
            RoutePattern::Exact(_) => None,
            RoutePattern::Prefix(prefix) => path
                .strip_prefix(prefix.as_str())
                .filter(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }

    fn prefix_len(&self) -> usize {
        match self {
            RoutePattern::Exact(path) | RoutePattern::Prefix(path) => path.len(),
        }
    }
}

fn is_dot_segment_path(path: &str) -> bool {
    path.split('/').any(|segment| segment == "." || segment == "..")
}

/// One immutable route: `(method, proxy_path)` → `service_name` + `actual_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub method: Method,
    pub proxy_path: String,
    pub service_name: String,
    pub actual_path: String,
    pub auth_required: bool,
    pattern: RoutePattern,
}

impl RouteDefinition {
    pub fn new(
        method: Method,
        proxy_path: impl Into<String>,
        service_name: impl Into<String>,
        actual_path: impl Into<String>,
        auth_required: bool,
    ) -> Result<Self, ConfigError> {
        let proxy_path = proxy_path.into();
        let actual_path = actual_path.into();
        let pattern = RoutePattern::parse(&proxy_path)?;
        validate_actual_path(&actual_path)?;

        Ok(Self {
            method,
            proxy_path,
            service_name: service_name.into(),
            actual_path,
            auth_required,
            pattern,
        })
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.pattern, RoutePattern::Prefix(_))
    }

    /// Outbound path for an inbound request that captured `remainder`.
    fn target_path(&self, remainder: Option<&str>) -> String {
        let remainder = remainder.unwrap_or_default();
        if self.actual_path == WILDCARD {
            if remainder.is_empty() {
                "/".to_string()
            } else {
                remainder.to_string()
            }
        } else if let Some(prefix) = self.actual_path.strip_suffix(WILDCARD_SEGMENT) {
            let joined = format!("{prefix}{remainder}");
            if joined.is_empty() {
                "/".to_string()
            } else {
                joined
            }
        } else {
            self.actual_path.clone()
        }
    }
}

/// `actual_path` is either the bare wildcard marker or an absolute path that may
/// end in `/*`.
pub fn validate_actual_path(actual_path: &str) -> Result<(), ConfigError> {
    if actual_path == WILDCARD {
        return Ok(());
    }
    RoutePattern::parse(actual_path).map(|_| ())
}

/// A successful lookup: the route plus the concrete outbound path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteDefinition>,
    pub target_path: String,
}

/// Finalized, read-only route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<RouteDefinition>>,
    exact: HashMap<Method, HashMap<String, usize>>,
    // Indexes into `routes`, longest prefix first.
    wildcards: Vec<usize>,
}

impl RouteTable {
    /// Build the table, failing on any duplicate `(method, proxy_path)` pair.
    pub fn build(
        definitions: impl IntoIterator<Item = RouteDefinition>,
    ) -> Result<Self, ConfigError> {
        let mut table = RouteTable::default();
        let mut seen: HashMap<Method, Vec<String>> = HashMap::new();

        for definition in definitions {
            let paths = seen.entry(definition.method.clone()).or_default();
            if paths.contains(&definition.proxy_path) {
                return Err(ConfigError::DuplicateRoute {
                    method: definition.method.to_string(),
                    path: definition.proxy_path.clone(),
                });
            }
            paths.push(definition.proxy_path.clone());

            let index = table.routes.len();
            match definition.pattern() {
                RoutePattern::Exact(path) => {
                    table
                        .exact
                        .entry(definition.method.clone())
                        .or_default()
                        .insert(path.clone(), index);
                }
                RoutePattern::Prefix(_) => table.wildcards.push(index),
            }
            table.routes.push(Arc::new(definition));
        }

        let routes = &table.routes;
        table
            .wildcards
            .sort_by_key(|&index| std::cmp::Reverse(routes[index].pattern().prefix_len()));

        Ok(table)
    }

    /// Expand configuration entries (one definition per listed method) and build.
    pub fn from_entries(entries: &[RouteEntry]) -> Result<Self, ConfigError> {
        let mut definitions = Vec::with_capacity(entries.len());
        for entry in entries {
            for raw_method in entry.method.methods() {
                definitions.push(RouteDefinition::new(
                    parse_method(raw_method)?,
                    entry.proxy_path.clone(),
                    entry.service_name.clone(),
                    entry.actual_path.clone(),
                    entry.auth_required,
                )?);
            }
        }
        Self::build(definitions)
    }

    /// Find the single route for `(method, path)`.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch, GatewayError> {
        if !path.starts_with('/') || is_dot_segment_path(path) {
            return Err(GatewayError::MalformedPath(path.to_string()));
        }

        if let Some(&index) = self.exact.get(method).and_then(|paths| paths.get(path)) {
            let route = self.routes[index].clone();
            let target_path = route.target_path(None);
            return Ok(RouteMatch { route, target_path });
        }

        self.wildcards
            .iter()
            .map(|&index| &self.routes[index])
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.pattern().capture(path).map(|remainder| RouteMatch {
                    route: route.clone(),
                    target_path: route.target_path(Some(remainder)),
                })
            })
            .ok_or_else(|| GatewayError::RouteNotFound {
                method: method.to_string(),
                path: path.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteDefinition>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
