//! Result and error types for Desviar.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Desviar operations
pub type DesviarResult<T> = Result<T, DesviarError>;

/// Errors that can occur in Desviar
///
/// No variant is ever recovered from locally; every failure surfaces as a
/// test failure. Mocked-network helpers fail loud and fast rather than mask
/// flakiness.
#[derive(Debug, Error)]
pub enum DesviarError {
    /// Fixture file does not exist
    #[error("fixture '{name}' not found at {}", path.display())]
    FixtureNotFound {
        /// Fixture name as registered on the rule
        name: String,
        /// Resolved path that was probed
        path: PathBuf,
    },

    /// Fixture file is not valid JSON
    #[error("fixture '{name}' is not valid JSON: {source}")]
    FixtureParse {
        /// Fixture name as registered on the rule
        name: String,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// No matching response observed within the configured window
    #[error("no matching response observed within {ms}ms")]
    ResponseTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Assertion failed
    #[error("assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("navigation to {url} failed: {message}")]
    NavigationError {
        /// URL or logical route that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Page error reported by the engine
    #[error("page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// URL pattern failed to compile at rule registration
    #[error("invalid URL pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern source
        pattern: String,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
