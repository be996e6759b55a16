//! Deterministic in-memory engine for hermetic tests.
//!
//! `SimPage` implements the [`PageDriver`] contract without a browser. It is
//! scripted: buttons are bound to the request a click issues, and a small
//! backend table answers requests the controller passes through. Every issued
//! request flows through [`Interceptor::decide`] and every response through
//! [`Interceptor::observe_response`], exactly as a real engine adapter would
//! drive them, so registration-before-trigger and wait semantics are
//! exercised for real.
//!
//! As a stand-in for application rendering, the sim sets the document body
//! text to the latest response body, enough for text assertions without a
//! DOM.

use crate::http::HttpMethod;
use crate::intercept::{Interceptor, RouteDecision};
use crate::page::{InterceptedRequest, NavigationOptions, PageDriver};
use crate::result::{DesviarError, DesviarResult};
use crate::wait::ObservedResponse;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Status the sim fulfills with when a rule leaves it unset
pub const SIM_DEFAULT_STATUS: u16 = 200;

/// What clicking a scripted button does: issue a request and, on a 2xx
/// response, navigate.
#[derive(Debug, Clone)]
pub struct ButtonScript {
    method: HttpMethod,
    url: String,
    navigate_to: Option<String>,
}

impl ButtonScript {
    /// Bind a click to a request
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            navigate_to: None,
        }
    }

    /// Navigate to `path` after a 2xx response
    #[must_use]
    pub fn then_navigate(mut self, path: impl Into<String>) -> Self {
        self.navigate_to = Some(path.into());
        self
    }
}

/// A scripted backend answer for pass-through requests.
#[derive(Debug, Clone)]
struct BackendRoute {
    method: HttpMethod,
    url_contains: String,
    status: u16,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct SimState {
    url: String,
    form: HashMap<String, String>,
    body_text: String,
}

/// In-memory page driving the interception controller.
pub struct SimPage {
    interceptor: Arc<Interceptor>,
    buttons: Mutex<HashMap<String, ButtonScript>>,
    backend: Mutex<Vec<BackendRoute>>,
    state: Mutex<SimState>,
}

impl std::fmt::Debug for SimPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimPage")
            .field("url", &self.url_snapshot())
            .finish_non_exhaustive()
    }
}

impl SimPage {
    /// Create a page wired to the given controller
    #[must_use]
    pub fn new(interceptor: Arc<Interceptor>) -> Self {
        Self {
            interceptor,
            buttons: Mutex::new(HashMap::new()),
            backend: Mutex::new(Vec::new()),
            state: Mutex::new(SimState::default()),
        }
    }

    /// Bind a button name to the request its click issues
    pub fn script_button(&self, name: impl Into<String>, script: ButtonScript) {
        if let Ok(mut buttons) = self.buttons.lock() {
            let _ = buttons.insert(name.into(), script);
        }
    }

    /// Script a backend answer for requests the controller passes through
    pub fn script_backend(
        &self,
        method: HttpMethod,
        url_contains: impl Into<String>,
        status: u16,
        body: Vec<u8>,
    ) {
        if let Ok(mut backend) = self.backend.lock() {
            backend.push(BackendRoute {
                method,
                url_contains: url_contains.into(),
                status,
                body,
            });
        }
    }

    /// Issue one request through the controller.
    ///
    /// Fulfillments come back with the rule's mock body (status defaulting to
    /// 200); pass-throughs are answered by the scripted backend, or 404 when
    /// nothing is scripted. Either way the response is reported to the
    /// controller, waking any matching wait handle.
    pub fn issue_request(
        &self,
        method: HttpMethod,
        url: &str,
    ) -> DesviarResult<ObservedResponse> {
        let request = InterceptedRequest::new(method, url);
        let response = match self.interceptor.decide(&request)? {
            RouteDecision::Fulfill(fulfillment) => ObservedResponse::new(
                method,
                url,
                fulfillment.status_or(SIM_DEFAULT_STATUS),
                fulfillment.body().to_vec(),
            ),
            RouteDecision::PassThrough => {
                let answer = self.backend_answer(method, url);
                ObservedResponse::new(method, url, answer.0, answer.1)
            }
        };

        if let Ok(mut state) = self.state.lock() {
            state.body_text = String::from_utf8_lossy(response.body()).into_owned();
        }
        self.interceptor.observe_response(response.clone());
        Ok(response)
    }

    /// Last value typed into the input with the given placeholder
    #[must_use]
    pub fn form_value(&self, placeholder: &str) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.form.get(placeholder).cloned())
    }

    fn backend_answer(&self, method: HttpMethod, url: &str) -> (u16, Vec<u8>) {
        self.backend
            .lock()
            .ok()
            .and_then(|backend| {
                backend
                    .iter()
                    .find(|route| route.method == method && url.contains(&route.url_contains))
                    .map(|route| (route.status, route.body.clone()))
            })
            .unwrap_or((404, Vec::new()))
    }

    fn url_snapshot(&self) -> String {
        self.state
            .lock()
            .map(|state| state.url.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageDriver for SimPage {
    async fn goto(&self, url: &str, _options: &NavigationOptions) -> DesviarResult<()> {
        if let Ok(mut state) = self.state.lock() {
            state.url = url.to_string();
        }
        Ok(())
    }

    async fn current_url(&self) -> String {
        self.url_snapshot()
    }

    async fn fill_by_placeholder(&self, placeholder: &str, value: &str) -> DesviarResult<()> {
        if let Ok(mut state) = self.state.lock() {
            let _ = state
                .form
                .insert(placeholder.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn click_button(&self, name: &str) -> DesviarResult<()> {
        let script = self
            .buttons
            .lock()
            .ok()
            .and_then(|buttons| buttons.get(name).cloned())
            .ok_or_else(|| DesviarError::PageError {
                message: format!("no button named '{name}'"),
            })?;

        let response = self.issue_request(script.method, &script.url)?;
        if response.status() < 300 {
            if let Some(path) = script.navigate_to {
                if let Ok(mut state) = self.state.lock() {
                    state.url = path;
                }
            }
        }
        Ok(())
    }

    async fn body_text(&self) -> String {
        self.state
            .lock()
            .map(|state| state.body_text.clone())
            .unwrap_or_default()
    }
}
