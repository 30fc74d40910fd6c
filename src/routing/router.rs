//! Service registry and route lookup.
//!
//! # Responsibilities
//! - Store compiled service routes
//! - Look up the route for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - Most specific prefix wins; ties resolve to configuration order
//! - Explicit NoMatch rather than silent default

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// A gateway prefix bound to one logical backend.
#[derive(Debug, Clone)]
pub struct ServiceRoute {
    matcher: PathPrefixMatcher,
    service_name: String,
    default_host: String,
    default_port: u16,
    strip_prefix: String,
    url_override: Option<String>,
}

impl ServiceRoute {
    pub fn new(
        service_name: impl Into<String>,
        prefix: impl Into<String>,
        default_host: impl Into<String>,
        default_port: u16,
    ) -> Self {
        let matcher = PathPrefixMatcher::new(prefix);
        let strip_prefix = matcher.prefix().to_string();
        Self {
            matcher,
            service_name: service_name.into(),
            default_host: default_host.into(),
            default_port,
            strip_prefix,
            url_override: None,
        }
    }

    pub fn with_strip_prefix(mut self, strip: impl Into<String>) -> Self {
        self.strip_prefix = strip.into();
        self
    }

    pub fn with_url_override(mut self, url: impl Into<String>) -> Self {
        self.url_override = Some(url.into());
        self
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        let host = config.host.clone().unwrap_or_else(|| config.name.clone());
        let mut route = Self::new(&config.name, &config.prefix, host, config.port);
        if let Some(strip) = &config.strip_prefix {
            route = route.with_strip_prefix(strip);
        }
        if let Some(url) = &config.url {
            route = route.with_url_override(url);
        }
        route
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn strip_prefix(&self) -> &str {
        &self.strip_prefix
    }

    pub fn specificity(&self) -> usize {
        self.matcher.specificity()
    }

    /// Returns true if this route's prefix covers `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Explicitly configured base URL (config file or environment), if any.
    pub fn configured_url(&self) -> Option<&str> {
        self.url_override.as_deref().map(|u| u.trim_end_matches('/'))
    }

    /// Base URL used for forwarding: the override, else the default host and port.
    pub fn base_url(&self) -> String {
        match self.configured_url() {
            Some(url) => url.to_string(),
            None => format!("http://{}:{}", self.default_host, self.default_port),
        }
    }
}

/// Immutable prefix → service table.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    routes: Vec<Arc<ServiceRoute>>,
}

impl ServiceRegistry {
    pub fn new(routes: Vec<ServiceRoute>) -> Self {
        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_config(services: &[ServiceConfig]) -> Self {
        Self::new(services.iter().map(ServiceRoute::from_config).collect())
    }

    /// Resolve the most specific route for `path`.
    pub fn resolve(&self, path: &str) -> Option<Arc<ServiceRoute>> {
        let mut best: Option<&Arc<ServiceRoute>> = None;
        for route in &self.routes {
            if !route.matches(path) {
                continue;
            }
            let better = match best {
                Some(current) => route.specificity() > current.specificity(),
                None => true,
            };
            if better {
                best = Some(route);
            }
        }
        best.cloned()
    }

    pub fn routes(&self) -> &[Arc<ServiceRoute>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
