//! Assertions surfaced by the page objects.
//!
//! Failures are real errors, not panics, so they flow through the same
//! propagation path as every other test failure.

use crate::result::{DesviarError, DesviarResult};

/// Assert the current URL equals the expected path
pub fn expect_url(actual: &str, expected: &str) -> DesviarResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(DesviarError::AssertionFailed {
            message: format!("expected URL '{expected}', got '{actual}'"),
        })
    }
}

/// Assert `haystack` contains `needle`
pub fn expect_contains_text(haystack: &str, needle: &str) -> DesviarResult<()> {
    if haystack.contains(needle) {
        Ok(())
    } else {
        Err(DesviarError::AssertionFailed {
            message: format!("expected page text to contain '{needle}'"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_url() {
        assert!(expect_url("/", "/").is_ok());
        let err = expect_url("/login", "/").unwrap_err();
        assert!(matches!(err, DesviarError::AssertionFailed { .. }));
    }

    #[test]
    fn test_expect_contains_text() {
        assert!(expect_contains_text("welcome plumrx", "plumrx").is_ok());
        assert!(expect_contains_text("welcome", "plumrx").is_err());
    }
}
