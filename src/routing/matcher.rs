//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix on segment boundaries (case-sensitive)
//! - Rank matches by specificity
//!
//! # Design Decisions
//! - `/api/menu` matches `/api/menu` and `/api/menu/55`, never `/api/menuitems`
//! - A trailing slash on the configured prefix is ignored
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: trimmed.to_string(),
        }
    }

    /// Returns true if `path` equals the prefix or continues it with a new segment.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix.is_empty() {
            return path.starts_with('/') || path.is_empty();
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Longer prefixes are more specific.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api/menu");

        assert!(matcher.matches("/api/menu"));
        assert!(matcher.matches("/api/menu/"));
        assert!(matcher.matches("/api/menu/55"));
        assert!(!matcher.matches("/api/menuitems"));
        assert!(!matcher.matches("/api"));
        assert!(!matcher.matches("/API/menu/55")); // Case sensitive
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let matcher = PathPrefixMatcher::new("/api/orders/");
        assert_eq!(matcher.prefix(), "/api/orders");
        assert!(matcher.matches("/api/orders"));
        assert!(matcher.matches("/api/orders/42"));
    }
}
