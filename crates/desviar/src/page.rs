//! The browser-automation engine contract and the navigation layer.
//!
//! The engine (page lifecycle, real network, DOM) is an external
//! collaborator. This crate needs three things from it: a routing hook that
//! forwards intercepted requests to [`crate::Interceptor::decide`] and
//! executes the decision, a report of every observed response into
//! [`crate::Interceptor::observe_response`], and the [`PageDriver`] surface
//! below for navigation and the interactions the page objects use.

use crate::http::HttpMethod;
use crate::result::{DesviarError, DesviarResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Fixed navigation timeout (30 seconds)
pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Page load states the navigation contract recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded`
    DomContentLoaded,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Options for a navigation
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Load state to wait for
    pub wait_until: LoadState,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout_ms: NAVIGATION_TIMEOUT_MS,
            wait_until: LoadState::Load,
        }
    }
}

impl NavigationOptions {
    /// Create options with the fixed 30-second wait-until-load policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set load state
    #[must_use]
    pub const fn with_wait_until(mut self, state: LoadState) -> Self {
        self.wait_until = state;
        self
    }
}

/// An intercepted request as exposed by the engine.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    method: HttpMethod,
    url: String,
}

impl InterceptedRequest {
    /// Create a new intercepted request
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    /// Request method
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Request URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Table mapping logical route names to URL paths.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl RouteTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, builder style
    #[must_use]
    pub fn with_route(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.register(name, path);
        self
    }

    /// Register a route
    pub fn register(&mut self, name: impl Into<String>, path: impl Into<String>) {
        let _ = self.routes.insert(name.into(), path.into());
    }

    /// Resolve a logical name to its path
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Contract the external browser-automation engine must satisfy.
///
/// Deliberately small: navigation with load-state semantics, the element
/// interactions the page objects need, and URL/body accessors for
/// assertions. Route interception and response waiting are handled through
/// the controller, not this trait.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the configured load state
    async fn goto(&self, url: &str, options: &NavigationOptions) -> DesviarResult<()>;

    /// Current page URL
    async fn current_url(&self) -> String;

    /// Fill the input identified by its placeholder text
    async fn fill_by_placeholder(&self, placeholder: &str, value: &str) -> DesviarResult<()>;

    /// Click the button with the given accessible name
    async fn click_button(&self, name: &str) -> DesviarResult<()>;

    /// Full visible text of the document body
    async fn body_text(&self) -> String;
}

/// Resolve a logical route and navigate with the fixed 30-second
/// wait-until-load policy.
///
/// # Errors
///
/// `NavigationError` for an unknown route name, or whatever the engine
/// reports for the navigation itself.
pub async fn goto_route<D: PageDriver + ?Sized>(
    driver: &D,
    table: &RouteTable,
    route: &str,
) -> DesviarResult<()> {
    let path = table
        .resolve(route)
        .ok_or_else(|| DesviarError::NavigationError {
            url: route.to_string(),
            message: "unknown route".to_string(),
        })?;
    tracing::debug!(route, path, "navigating");
    driver.goto(path, &NavigationOptions::new()).await
}
