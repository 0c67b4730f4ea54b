use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Values taken from the process environment that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub app_host: Option<String>,
    pub app_port: Option<String>,
    pub environment: Option<String>,
}

impl EnvOverrides {
    /// Read `APP_HOST`, `APP_PORT` and `ENV`; empty values are ignored.
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            app_host: read("APP_HOST"),
            app_port: read("APP_PORT"),
            environment: read("ENV"),
        }
    }
}

/// Load configuration from a file using the config crate, applying the
/// `APP_HOST` / `APP_PORT` / `ENV` environment overrides.
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<GatewayConfig> {
    load_config_sync(config_path, &EnvOverrides::from_env())
}

/// Load configuration synchronously with explicit overrides
pub fn load_config_sync(config_path: &str, overrides: &EnvOverrides) -> Result<GatewayConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml, // Default to YAML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .set_override_option("app_host", overrides.app_host.clone())
        .and_then(|builder| builder.set_override_option("app_port", overrides.app_port.clone()))
        .and_then(|builder| {
            builder.set_override_option("environment", overrides.environment.clone())
        })
        .wrap_err("Failed to apply environment overrides")?
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let gateway_config: GatewayConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(gateway_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const YAML_CONFIG: &str = r#"
app_host: "127.0.0.1"
app_port: 3000
environment: production
auth:
  service: auth-go
services:
  auth-go:
    host: auth-go
    port: 3000
  email-service:
    host: email-service
    port: 3001
routes:
  - proxy_path: /auth/api/v1/login
    service: auth-go
    actual_path: /login
    method: POST
    auth_required: false
  - proxy_path: /email/api/v1/send
    service: email-service
    actual_path: /api/v1/send
    method: [POST, PUT]
"#;

    fn yaml_file() -> NamedTempFile {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", YAML_CONFIG).unwrap();
        temp_file
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let temp_file = yaml_file();
        let config = load_config_sync(
            temp_file.path().to_str().unwrap(),
            &EnvOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.app_url(), "127.0.0.1:3000");
        assert_eq!(config.environment, "production");
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.routes.len(), 2);
        assert!(!config.routes[0].auth_required);
        assert!(config.routes[1].auth_required);
        assert_eq!(config.routes[1].method.methods(), vec!["POST", "PUT"]);
        assert_eq!(config.auth.verify_path, "/verify");
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let temp_file = yaml_file();
        let overrides = EnvOverrides {
            app_host: Some("0.0.0.0".to_string()),
            app_port: Some("9090".to_string()),
            environment: Some("development".to_string()),
        };
        let config = load_config_sync(temp_file.path().to_str().unwrap(), &overrides).unwrap();

        assert_eq!(config.app_url(), "0.0.0.0:9090");
        assert!(config.is_development());
    }

    #[test]
    fn test_invalid_port_override_fails() {
        let temp_file = yaml_file();
        let overrides = EnvOverrides {
            app_port: Some("not-a-port".to_string()),
            ..EnvOverrides::default()
        };
        assert!(load_config_sync(temp_file.path().to_str().unwrap(), &overrides).is_err());
    }

    #[test]
    fn test_load_json_config() {
        let json_content = r#"
{
  "auth": { "service": "auth", "timeout": "2s" },
  "services": { "auth": { "host": "localhost", "port": 4000 } },
  "routes": [
    { "proxy_path": "/files/*", "service_name": "auth", "actual_path": "*", "method": "GET" }
  ]
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config_sync(
            temp_file.path().to_str().unwrap(),
            &EnvOverrides::default(),
        )
        .unwrap();
        assert_eq!(config.app_url(), "0.0.0.0:8080");
        assert_eq!(config.routes.len(), 1);
        assert_eq!(
            config.auth.timeout_duration().unwrap(),
            std::time::Duration::from_secs(2)
        );
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(load_config_sync("/definitely/not/here.yaml", &EnvOverrides::default()).is_err());
    }
}
