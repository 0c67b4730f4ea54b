use std::collections::HashSet;

use crate::{
    config::models::{GatewayConfig, RouteEntry},
    core::{
        HEALTH_PATH,
        rewrite::UPSTREAM_SCHEME,
        route_table::{RoutePattern, parse_method, validate_actual_path},
    },
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Unknown service '{service}' referenced by {referenced_by}")]
    UnknownService {
        service: String,
        referenced_by: String,
    },

    #[error("Route conflict detected: {message}")]
    RouteConflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator.
///
/// Collects every problem in one pass so `wicket validate` can report them all.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire gateway configuration
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(config) {
            errors.push(e);
        }

        if config.upstream_scheme != UPSTREAM_SCHEME {
            errors.push(ValidationError::InvalidField {
                field: "upstream_scheme".to_string(),
                message: format!(
                    "'{}' is not supported, backends are reached over plain http",
                    config.upstream_scheme
                ),
            });
        }

        if let Err(e) = Self::validate_duration("backend_timeout", &config.backend_timeout) {
            errors.push(e);
        }
        if let Err(e) = Self::validate_duration("auth.timeout", &config.auth.timeout) {
            errors.push(e);
        }

        if !config.auth.verify_path.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: "auth.verify_path".to_string(),
                message: "must start with '/'".to_string(),
            });
        }
        if !config.services.contains_key(&config.auth.service) {
            errors.push(ValidationError::UnknownService {
                service: config.auth.service.clone(),
                referenced_by: "auth.service".to_string(),
            });
        }

        for (name, target) in &config.services {
            if target.host.is_empty() {
                errors.push(ValidationError::MissingField {
                    field: format!("services.{name}.host"),
                });
            }
            if target.port == 0 {
                errors.push(ValidationError::InvalidField {
                    field: format!("services.{name}.port"),
                    message: "port must be non-zero".to_string(),
                });
            }
        }

        if config.routes.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "routes".to_string(),
            });
        }
        for route in &config.routes {
            errors.extend(Self::validate_route(config, route));
        }
        errors.extend(Self::check_route_conflicts(&config.routes));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_listen_address(config: &GatewayConfig) -> ValidationResult<()> {
        if config.app_host.trim().is_empty() {
            return Err(ValidationError::InvalidListenAddress {
                address: config.app_url(),
                reason: "APP_HOST must not be empty".to_string(),
            });
        }
        if config.app_port == 0 {
            return Err(ValidationError::InvalidListenAddress {
                address: config.app_url(),
                reason: "APP_PORT must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }

    fn validate_duration(field: &str, value: &str) -> ValidationResult<()> {
        match humantime::parse_duration(value) {
            Ok(duration) if duration.is_zero() => Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: "must be greater than zero".to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) => Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: format!("'{value}' is not a duration ({e}); use e.g. '5s' or '1m'"),
            }),
        }
    }

    fn validate_route(config: &GatewayConfig, route: &RouteEntry) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let label = format!("route '{}'", route.proxy_path);

        if let Err(e) = RoutePattern::parse(&route.proxy_path) {
            errors.push(ValidationError::InvalidField {
                field: format!("{label} proxy_path"),
                message: e.to_string(),
            });
        }
        // GET and HEAD on the health path never reach the route table.
        let shadows_health_check = route
            .method
            .methods()
            .iter()
            .any(|method| matches!(*method, "GET" | "HEAD"));
        if route.proxy_path == HEALTH_PATH && shadows_health_check {
            errors.push(ValidationError::RouteConflict {
                message: format!("GET {HEALTH_PATH} is reserved for the gateway health check"),
            });
        }
        if let Err(e) = validate_actual_path(&route.actual_path) {
            errors.push(ValidationError::InvalidField {
                field: format!("{label} actual_path"),
                message: e.to_string(),
            });
        }

        let methods = route.method.methods();
        if methods.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("{label} method"),
            });
        }
        for method in methods {
            if let Err(e) = parse_method(method) {
                errors.push(ValidationError::InvalidField {
                    field: format!("{label} method"),
                    message: format!("{e}; use an uppercase standard verb such as GET or POST"),
                });
            }
        }

        if !config.services.contains_key(&route.service_name) {
            errors.push(ValidationError::UnknownService {
                service: route.service_name.clone(),
                referenced_by: label,
            });
        }

        errors
    }

    fn check_route_conflicts(routes: &[RouteEntry]) -> Vec<ValidationError> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();
        for route in routes {
            for method in route.method.methods() {
                if !seen.insert((method, route.proxy_path.as_str())) {
                    errors.push(ValidationError::RouteConflict {
                        message: format!("{method} {} is defined more than once", route.proxy_path),
                    });
                }
            }
        }
        errors
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} configuration errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
