//! Desviar: fixture-backed network interception for browser e2e tests.
//!
//! Desviar (Spanish: "to divert") sits between a test and a
//! browser-automation engine's network layer. Tests register interception
//! rules that rewrite outgoing requests with fixture-backed mock responses,
//! and separately await a predicate-based handle for the matching response.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    DESVIAR Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌─────────────┐    ┌────────────┐           │
//! │   │ Test /     │    │ Interceptor │    │ Engine     │           │
//! │   │ PageObject │───►│ rules +     │◄───│ (external, │           │
//! │   │            │    │ wait stream │    │ or SimPage)│           │
//! │   └────────────┘    └─────────────┘    └────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Registration and waiting are two phases on purpose: install the mock
//! first, then trigger the action and await the handle concurrently, so the
//! request can never fire before the rule exists.
//!
//! ```no_run
//! use desviar::{
//!     FixtureDir, HttpMethod, InterceptOptions, Interceptor, InterceptorConfig, UrlMatcher,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn demo() -> desviar::DesviarResult<()> {
//! let interceptor = Arc::new(Interceptor::new(InterceptorConfig::new(FixtureDir::new(
//!     "tests/fixtures",
//! ))));
//!
//! // Register the mock, trigger the action, then await the handle.
//! let wait_for_login = interceptor.register(
//!     HttpMethod::Post,
//!     UrlMatcher::pattern(r"users/login$")?,
//!     InterceptOptions::new()
//!         .with_status(200)
//!         .with_body(json!({"user": {"username": "plumrx"}})),
//! );
//! // ... trigger the form submission through the engine ...
//! let response = wait_for_login.wait().await?;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Assertions surfaced by the page objects
pub mod assertion;
/// Fixture loading from an explicit directory
pub mod fixture;
/// Conduit page objects
pub mod harness;
/// HTTP methods for request matching
pub mod http;
/// Network request interception
pub mod intercept;
/// URL matching for rules and response predicates
pub mod matcher;
/// Engine contract and navigation
pub mod page;
/// Result and error types
pub mod result;
/// Deterministic in-memory engine
pub mod sim;
/// Step runtime for named operation scopes
pub mod step;
/// Response waits
pub mod wait;

pub use fixture::FixtureDir;
pub use harness::{AppRoute, ConduitPage};
pub use http::HttpMethod;
pub use intercept::{
    Fulfillment, InterceptOptions, InterceptRule, Interceptor, InterceptorConfig, RouteDecision,
    Transform, TransformResult,
};
pub use matcher::UrlMatcher;
pub use page::{
    goto_route, InterceptedRequest, LoadState, NavigationOptions, PageDriver, RouteTable,
    NAVIGATION_TIMEOUT_MS,
};
pub use result::{DesviarError, DesviarResult};
pub use sim::{ButtonScript, SimPage, SIM_DEFAULT_STATUS};
pub use wait::{
    ObservedResponse, ResponsePredicate, WaitHandle, DEFAULT_RESPONSE_TIMEOUT_MS,
};

/// Step-wrapper attribute macro (requires the `derive` feature)
#[cfg(feature = "derive")]
pub use desviar_derive::page_steps;
