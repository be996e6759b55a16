//! Network request interception with fixture-backed mock responses.
//!
//! The controller sits between a test and the browser-automation engine's
//! network layer. A test registers a rule and gets a [`WaitHandle`] back
//! synchronously; the engine forwards every intercepted request to
//! [`Interceptor::decide`] and executes the returned decision, and reports
//! every observed response through [`Interceptor::observe_response`].
//!
//! Rules are evaluated in registration order and the first rule whose URL
//! matcher matches the request decides, fulfill or pass through, after
//! which evaluation stops. Fulfillment is terminal for the request.

use crate::fixture::FixtureDir;
use crate::http::HttpMethod;
use crate::matcher::UrlMatcher;
use crate::page::InterceptedRequest;
use crate::result::DesviarResult;
use crate::wait::{
    ObservedResponse, ResponsePredicate, WaitHandle, DEFAULT_RESPONSE_TIMEOUT_MS,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Outcome of applying a transform to a loaded fixture document.
///
/// An explicit sum type: `Replace` substitutes the fulfilled body, `Keep`
/// fulfills with the raw fixture exactly as parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
    /// Use this value as the response body instead of the fixture
    Replace(Value),
    /// Use the fixture document unchanged
    Keep,
}

/// Pure function rewriting a loaded fixture before fulfillment
pub type Transform = Arc<dyn Fn(&Value) -> TransformResult + Send + Sync>;

/// Configuration for one interception rule.
#[derive(Clone)]
pub struct InterceptOptions {
    fixture: Option<String>,
    transform: Option<Transform>,
    status: Option<u16>,
    body: Option<Value>,
    timeout_ms: u64,
}

impl Default for InterceptOptions {
    fn default() -> Self {
        Self {
            fixture: None,
            transform: None,
            status: None,
            body: None,
            timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        }
    }
}

impl std::fmt::Debug for InterceptOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptOptions")
            .field("fixture", &self.fixture)
            .field("transform", &self.transform.is_some())
            .field("status", &self.status)
            .field("body", &self.body)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl InterceptOptions {
    /// Create options with defaults (no fixture, no body, 4000ms wait)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fulfill from a fixture file, referenced by name
    #[must_use]
    pub fn with_fixture(mut self, name: impl Into<String>) -> Self {
        self.fixture = Some(name.into());
        self
    }

    /// Rewrite the loaded fixture before fulfillment
    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Value) -> TransformResult + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Fulfill with this status code (engine default when unset)
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Fulfill with this literal JSON value
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Fulfill with a serializable value as the JSON body
    pub fn with_json<T: Serialize>(self, data: &T) -> DesviarResult<Self> {
        let body = serde_json::to_value(data)?;
        Ok(self.with_body(body))
    }

    /// Response wait window in milliseconds
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The registered fixture name, if any
    #[must_use]
    pub fn fixture(&self) -> Option<&str> {
        self.fixture.as_deref()
    }

    /// The registered transform, if any
    #[must_use]
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// The registered status code, if any
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// The registered literal body, if any
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The wait window in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

/// One registered interception rule.
///
/// Immutable after creation; body resolution for a request is computed into
/// locals, never written back, so concurrent requests cannot observe each
/// other's resolution.
#[derive(Debug)]
pub struct InterceptRule {
    method: HttpMethod,
    matcher: UrlMatcher,
    options: InterceptOptions,
}

impl InterceptRule {
    fn new(method: HttpMethod, matcher: UrlMatcher, options: InterceptOptions) -> Self {
        Self {
            method,
            matcher,
            options,
        }
    }

    /// Method this rule fulfills
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// URL matcher this rule selects requests with
    #[must_use]
    pub const fn matcher(&self) -> &UrlMatcher {
        &self.matcher
    }

    /// Rule configuration
    #[must_use]
    pub const fn options(&self) -> &InterceptOptions {
        &self.options
    }
}

/// A mock response the engine must fulfill an intercepted request with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
    status: Option<u16>,
    body: Vec<u8>,
    content_type: String,
}

impl Fulfillment {
    fn json(status: Option<u16>, value: &Value) -> DesviarResult<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::raw(status, body))
    }

    fn raw(status: Option<u16>, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            content_type: "application/json".to_string(),
        }
    }

    /// Status code to fulfill with; `None` means the engine's default
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Status code, or `default` when the rule left it unset
    #[must_use]
    pub fn status_or(&self, default: u16) -> u16 {
        self.status.unwrap_or(default)
    }

    /// Response body bytes
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Content type of the body
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Parse the body back into JSON
    pub fn body_json(&self) -> DesviarResult<Value> {
        let value = serde_json::from_slice(&self.body)?;
        Ok(value)
    }
}

/// What the engine must do with one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Respond with the given mock; terminal, no further rule may run
    Fulfill(Fulfillment),
    /// Let the request proceed to the network unmodified
    PassThrough,
}

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct InterceptorConfig {
    fixture_dir: FixtureDir,
    pass_through_suffixes: Vec<String>,
    response_buffer: usize,
}

impl InterceptorConfig {
    /// Create a configuration with the given fixture directory.
    ///
    /// The pass-through suffix list defaults to `[".ts"]`: dev servers ask
    /// for source modules over HTTP, and those requests must never be mocked.
    #[must_use]
    pub fn new(fixture_dir: FixtureDir) -> Self {
        Self {
            fixture_dir,
            pass_through_suffixes: vec![".ts".to_string()],
            response_buffer: 64,
        }
    }

    /// Replace the pass-through suffix list.
    ///
    /// Requests whose path (query string excluded) ends with any of these
    /// suffixes always pass through, regardless of method match. An empty
    /// list disables the exclusion entirely.
    #[must_use]
    pub fn with_pass_through_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.pass_through_suffixes = suffixes;
        self
    }

    /// Capacity of the observed-response buffer
    #[must_use]
    pub const fn with_response_buffer(mut self, capacity: usize) -> Self {
        self.response_buffer = capacity;
        self
    }

    /// The configured fixture directory
    #[must_use]
    pub const fn fixture_dir(&self) -> &FixtureDir {
        &self.fixture_dir
    }

    /// The configured pass-through suffixes
    #[must_use]
    pub fn pass_through_suffixes(&self) -> &[String] {
        &self.pass_through_suffixes
    }
}

/// The interception controller.
///
/// Holds registered rules in registration order and the observed-response
/// stream that wait handles subscribe to. Rules live for the duration of the
/// page's routing scope and are never explicitly unregistered.
pub struct Interceptor {
    config: InterceptorConfig,
    rules: Mutex<Vec<Arc<InterceptRule>>>,
    responses: broadcast::Sender<ObservedResponse>,
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("config", &self.config)
            .field("rules", &self.rule_count())
            .finish_non_exhaustive()
    }
}

impl Interceptor {
    /// Create a controller with the given configuration
    #[must_use]
    pub fn new(config: InterceptorConfig) -> Self {
        let (responses, _) = broadcast::channel(config.response_buffer);
        Self {
            config,
            rules: Mutex::new(Vec::new()),
            responses,
        }
    }

    /// Register an interception rule and return its wait handle.
    ///
    /// The handle is returned synchronously and its response subscription is
    /// attached here, so a test can register the mock, then trigger the
    /// action and await the handle concurrently without a missed-event race.
    pub fn register(
        &self,
        method: HttpMethod,
        matcher: impl Into<UrlMatcher>,
        options: InterceptOptions,
    ) -> WaitHandle {
        let matcher = matcher.into();
        let timeout = Duration::from_millis(options.timeout_ms());
        let predicate = ResponsePredicate::new(method, matcher.clone());
        let receiver = self.responses.subscribe();

        let rule = Arc::new(InterceptRule::new(method, matcher, options));
        tracing::debug!(method = %rule.method(), matcher = %rule.matcher(), "rule registered");
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(rule);
        }

        WaitHandle::new(receiver, predicate, timeout)
    }

    /// Evaluate one intercepted request against the registered rules.
    ///
    /// The first rule whose URL matcher matches the request decides, and
    /// evaluation stops, even when that decision is a pass-through (a rule
    /// registered later for the same URL never sees the request). With no
    /// matching rule the request passes through.
    pub fn decide(&self, request: &InterceptedRequest) -> DesviarResult<RouteDecision> {
        let rule = self
            .rules
            .lock()
            .map(|rules| {
                rules
                    .iter()
                    .find(|rule| rule.matcher().matches(request.url()))
                    .cloned()
            })
            .unwrap_or(None);

        let Some(rule) = rule else {
            return Ok(RouteDecision::PassThrough);
        };

        if self.is_pass_through_path(request.url()) {
            tracing::trace!(url = request.url(), "pass-through suffix, not mocking");
            return Ok(RouteDecision::PassThrough);
        }

        if request.method() != rule.method() {
            tracing::trace!(
                url = request.url(),
                method = %request.method(),
                "method mismatch, not mocking"
            );
            return Ok(RouteDecision::PassThrough);
        }

        let fulfillment = self.resolve(rule.options())?;
        tracing::debug!(
            url = request.url(),
            status = ?fulfillment.status(),
            "fulfilling intercepted request"
        );
        Ok(RouteDecision::Fulfill(fulfillment))
    }

    /// Resolve the response body for a matched rule.
    ///
    /// When both a fixture and a transform are set, the fixture is loaded
    /// fresh, rewritten, and consumed; the file is not read a second time
    /// below. Resolution is confined to this request; the shared rule is
    /// never mutated.
    fn resolve(&self, options: &InterceptOptions) -> DesviarResult<Fulfillment> {
        let mut body = options.body().cloned();
        let mut fixture = options.fixture();

        if let (Some(name), Some(transform)) = (options.fixture(), options.transform()) {
            let document = self.config.fixture_dir.load(name)?;
            body = Some(match transform(&document) {
                TransformResult::Replace(value) => value,
                TransformResult::Keep => document,
            });
            fixture = None;
        }

        if let Some(value) = body {
            Fulfillment::json(options.status(), &value)
        } else if let Some(name) = fixture {
            let bytes = self.config.fixture_dir.read_raw(name)?;
            Ok(Fulfillment::raw(options.status(), bytes))
        } else {
            Ok(Fulfillment::raw(options.status(), Vec::new()))
        }
    }

    /// Record a response observed on the page, waking matching wait handles.
    pub fn observe_response(&self, response: ObservedResponse) {
        // Send fails only when no handle is subscribed; that is not an error.
        let _ = self.responses.send(response);
    }

    /// Load and parse a fixture document
    pub fn fixture(&self, name: &str) -> DesviarResult<Value> {
        self.config.fixture_dir.load(name)
    }

    /// Number of registered rules
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.lock().map(|rules| rules.len()).unwrap_or(0)
    }

    /// Controller configuration
    #[must_use]
    pub const fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    fn is_pass_through_path(&self, url: &str) -> bool {
        let path = url.split('?').next().unwrap_or(url);
        self.config
            .pass_through_suffixes
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
    }
}
