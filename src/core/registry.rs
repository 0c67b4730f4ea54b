//! Logical service name → network target.
use std::collections::HashMap;

use crate::{config::ServiceTarget, core::error::ConfigError};

/// Read-only map of backend services, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceTarget>,
}

impl ServiceRegistry {
    pub fn new(services: HashMap<String, ServiceTarget>) -> Result<Self, ConfigError> {
        for (name, target) in &services {
            if target.host.is_empty() || target.port == 0 {
                return Err(ConfigError::InvalidAddress(format!(
                    "{name} -> {}",
                    target.authority()
                )));
            }
        }
        Ok(Self { services })
    }

    pub fn lookup(&self, service_name: &str) -> Option<&ServiceTarget> {
        self.services.get(service_name)
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.services.contains_key(service_name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
