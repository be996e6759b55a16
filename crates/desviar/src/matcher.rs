//! URL matching for interception rules and response predicates.

use crate::result::{DesviarError, DesviarResult};
use regex::Regex;

/// How a rule selects request URLs.
///
/// A plain string matches by substring containment; a pattern matches with a
/// compiled regex. Both the route-decision path and the wait-handle predicate
/// share the same matcher, so a rule and its response wait can never disagree
/// about what "matching" means.
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    /// Substring containment on the request URL
    Substring(String),
    /// Regex match on the request URL
    Pattern(Regex),
}

impl UrlMatcher {
    /// Create a substring matcher
    #[must_use]
    pub fn substring(needle: impl Into<String>) -> Self {
        Self::Substring(needle.into())
    }

    /// Compile a pattern matcher.
    ///
    /// Compilation happens here, at registration, so a bad pattern fails the
    /// test immediately instead of silently never matching.
    pub fn pattern(pattern: &str) -> DesviarResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| DesviarError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::Pattern(regex))
    }

    /// Check if a URL matches
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Substring(needle) => url.contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(url),
        }
    }
}

impl From<&str> for UrlMatcher {
    fn from(needle: &str) -> Self {
        Self::Substring(needle.to_string())
    }
}

impl From<String> for UrlMatcher {
    fn from(needle: String) -> Self {
        Self::Substring(needle)
    }
}

impl From<Regex> for UrlMatcher {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl std::fmt::Display for UrlMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Substring(s) => write!(f, "{s}"),
            Self::Pattern(regex) => write!(f, "{}", regex.as_str()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_substring_contains() {
        let matcher = UrlMatcher::substring("/api/users");
        assert!(matcher.matches("https://example.com/api/users"));
        assert!(matcher.matches("https://example.com/api/users/1?x=y"));
        assert!(!matcher.matches("https://example.com/api/tags"));
    }

    #[test]
    fn test_pattern_anchored() {
        let matcher = UrlMatcher::pattern(r"users/login$").unwrap();
        assert!(matcher.matches("https://example.com/api/users/login"));
        assert!(!matcher.matches("https://example.com/api/users/login/extra"));
    }

    #[test]
    fn test_invalid_pattern_fails_registration() {
        let err = UrlMatcher::pattern("users/(").unwrap_err();
        assert!(matches!(err, DesviarError::InvalidPattern { .. }));
    }

    #[test]
    fn test_from_str_is_substring() {
        let matcher: UrlMatcher = "/api/".into();
        assert!(matches!(matcher, UrlMatcher::Substring(_)));
        assert!(matcher.matches("https://example.com/api/users"));
    }

    #[test]
    fn test_from_regex_is_pattern() {
        let matcher: UrlMatcher = Regex::new(r"/users/\d+").unwrap().into();
        assert!(matcher.matches("https://example.com/users/42"));
        assert!(!matcher.matches("https://example.com/users/abc"));
    }

    #[test]
    fn test_display() {
        assert_eq!(UrlMatcher::substring("/api/").to_string(), "/api/");
        assert_eq!(
            UrlMatcher::pattern(r"login$").unwrap().to_string(),
            "login$"
        );
    }

    proptest! {
        // Substring semantics are exactly str::contains, for any needle.
        #[test]
        fn prop_substring_matches_iff_contains(url in ".{0,64}", needle in ".{0,16}") {
            let matcher = UrlMatcher::substring(needle.clone());
            prop_assert_eq!(matcher.matches(&url), url.contains(&needle));
        }

        // An escaped pattern agrees with the substring matcher.
        #[test]
        fn prop_escaped_pattern_agrees_with_substring(url in ".{0,64}", needle in ".{1,16}") {
            let pattern = UrlMatcher::pattern(&regex::escape(&needle)).unwrap();
            let substring = UrlMatcher::substring(needle);
            prop_assert_eq!(pattern.matches(&url), substring.matches(&url));
        }
    }
}
