//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{GatewayConfig, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load, apply environment overrides to, and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Apply environment overrides to an in-memory config and validate it.
pub fn finalize(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Replace each service's URL with `<SERVICE>_URL` when the lookup has one.
///
/// `menu-service` is looked up as `MENU_SERVICE_URL` first, then as the
/// literal upper-cased `MENU-SERVICE_URL`.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for service in &mut config.services {
        let found = env_keys(service)
            .into_iter()
            .find_map(|key| lookup(&key).filter(|v| !v.trim().is_empty()).map(|v| (key, v)));

        if let Some((key, value)) = found {
            tracing::debug!(service = %service.name, env = %key, url = %value, "Service address overridden from environment");
            service.url = Some(value.trim().to_string());
        }
    }
}

fn env_keys(service: &ServiceConfig) -> Vec<String> {
    let upper = service.name.to_uppercase();
    let normalized = upper.replace(['-', '.'], "_");
    if normalized == upper {
        vec![format!("{}_URL", upper)]
    } else {
        vec![format!("{}_URL", normalized), format!("{}_URL", upper)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_override_prefers_normalized_key() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MENU_SERVICE_URL", "http://10.0.0.5:9000"),
            ("MENU-SERVICE_URL", "http://legacy:1"),
            ("ORDER-SERVICE_URL", "http://orders.internal:8084 "),
            ("USER_SERVICE_URL", ""),
        ]);
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        let url_of = |name: &str| {
            config
                .services
                .iter()
                .find(|s| s.name == name)
                .and_then(|s| s.url.clone())
        };
        assert_eq!(url_of("menu-service").as_deref(), Some("http://10.0.0.5:9000"));
        assert_eq!(url_of("order-service").as_deref(), Some("http://orders.internal:8084"));
        assert_eq!(url_of("user-service"), None);
        assert_eq!(url_of("review-service"), None);
    }

    #[test]
    fn test_https_env_override_fails_validation() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| {
            (k == "PAYMENT_SERVICE_URL").then(|| "https://127.0.0.1:8443".to_string())
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            &errors[..],
            [ValidationError::ServiceUrl { service, .. }] if service == "payment-service"
        ));
    }

    #[test]
    fn test_parse_partial_toml() {
        let raw = r#"
            [breaker]
            failure_threshold = 5

            [[services]]
            name = "menu-service"
            prefix = "/api/menu"
            port = 8083
            url = "http://127.0.0.1:18083"
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.reset_timeout_secs, 30);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.forwarder.max_retries, 2);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
