//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route table integrity (unique names and prefixes)
//! - Validate value ranges (thresholds > 0, timeouts > 0)
//! - Service URLs must be plain `http`; the outbound connector speaks no TLS
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),
    #[error("service '{0}' is defined more than once")]
    DuplicateService(String),
    #[error("prefix '{0}' is used by more than one service")]
    DuplicatePrefix(String),
    #[error("service '{service}': prefix '{prefix}' must start with '/'")]
    PrefixFormat { service: String, prefix: String },
    #[error("service '{service}': strip prefix '{strip}' is not a prefix of '{prefix}'")]
    StripPrefix {
        service: String,
        prefix: String,
        strip: String,
    },
    #[error("service '{service}': invalid url '{url}' (expected http://host[:port])")]
    ServiceUrl { service: String, url: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check the configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let mut names = HashSet::new();
    let mut prefixes = HashSet::new();
    for service in &config.services {
        if !names.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }

        let prefix = service.prefix.trim_end_matches('/');
        if !prefixes.insert(prefix) {
            errors.push(ValidationError::DuplicatePrefix(service.prefix.clone()));
        }
        if !service.prefix.starts_with('/') {
            errors.push(ValidationError::PrefixFormat {
                service: service.name.clone(),
                prefix: service.prefix.clone(),
            });
        }

        if let Some(strip) = &service.strip_prefix {
            if !service.prefix.starts_with(strip.as_str()) {
                errors.push(ValidationError::StripPrefix {
                    service: service.name.clone(),
                    prefix: service.prefix.clone(),
                    strip: strip.clone(),
                });
            }
        }

        if let Some(raw) = &service.url {
            let valid = url::Url::parse(raw)
                .map(|u| u.scheme() == "http" && u.host().is_some())
                .unwrap_or(false);
            if !valid {
                errors.push(ValidationError::ServiceUrl {
                    service: service.name.clone(),
                    url: raw.clone(),
                });
            }
        }
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::Zero("breaker.failure_threshold"));
    }
    if config.breaker.reset_timeout_secs == 0 {
        errors.push(ValidationError::Zero("breaker.reset_timeout_secs"));
    }
    if config.forwarder.attempt_timeout_ms == 0 {
        errors.push(ValidationError::Zero("forwarder.attempt_timeout_ms"));
    }
    if config.health.timeout_ms == 0 {
        errors.push(ValidationError::Zero("health.timeout_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::Zero("rate_limit.max_requests"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::Zero("rate_limit.window_secs"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
