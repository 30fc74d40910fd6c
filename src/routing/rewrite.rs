//! Path rewriting from the gateway namespace to the backend namespace.

use crate::routing::router::ServiceRoute;

/// Rewrite `original_path` for the backend behind `route`.
///
/// Paths under the route prefix lose the route's strip prefix. Anything else
/// loses its first two segments (`/a/b/rest` → `/rest`). The result always
/// starts with `/`.
pub fn rewrite(original_path: &str, route: &ServiceRoute) -> String {
    let stripped = if route.matches(original_path) {
        original_path
            .strip_prefix(route.strip_prefix())
            .unwrap_or(original_path)
            .to_string()
    } else {
        strip_two_segments(original_path)
    };

    if stripped.starts_with('/') {
        stripped
    } else {
        format!("/{}", stripped)
    }
}

fn strip_two_segments(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.get(3..) {
        Some(rest) => format!("/{}", rest.join("/")),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> ServiceRoute {
        ServiceRoute::new("order-service", "/api/orders", "order-service", 8084)
    }

    #[test]
    fn test_strips_route_prefix() {
        assert_eq!(rewrite("/api/orders/42", &orders()), "/42");
        assert_eq!(rewrite("/api/orders/42/items", &orders()), "/42/items");
        assert_eq!(rewrite("/api/orders/", &orders()), "/");
        assert_eq!(rewrite("/api/orders", &orders()), "/");
    }

    #[test]
    fn test_menu_example() {
        let menu = ServiceRoute::new("menu-service", "/api/menu", "menu-service", 8083);
        assert_eq!(rewrite("/api/menu/55", &menu), "/55");
    }

    #[test]
    fn test_custom_strip_prefix() {
        let route = ServiceRoute::new("users", "/api/users", "users", 80).with_strip_prefix("/api");
        assert_eq!(rewrite("/api/users/7", &route), "/users/7");
    }

    #[test]
    fn test_unmatched_path_strips_two_segments() {
        assert_eq!(rewrite("/internal/probe/health", &orders()), "/health");
        assert_eq!(rewrite("/internal/probe/a/b", &orders()), "/a/b");
        assert_eq!(rewrite("/internal/probe", &orders()), "/");
        assert_eq!(rewrite("/x", &orders()), "/");
    }

    #[test]
    fn test_total_over_malformed_input() {
        assert_eq!(rewrite("", &orders()), "/");
        assert_eq!(rewrite("no-slash", &orders()), "/");
        assert_eq!(rewrite("a/b/c", &orders()), "/");
        assert_eq!(rewrite("//", &orders()), "/");
    }
}
