//! Conduit page objects: the app-facing harness bound to a driver.
//!
//! Encapsulates the flows the e2e suite drives (navigation through logical
//! routes, the mocked login flow, and text assertions) on top of any
//! [`PageDriver`] implementation.

use crate::assertion;
use crate::http::HttpMethod;
use crate::intercept::{InterceptOptions, Interceptor};
use crate::matcher::UrlMatcher;
use crate::page::{goto_route, PageDriver, RouteTable};
use crate::result::{DesviarError, DesviarResult};
use crate::step;
use crate::wait::WaitHandle;
use serde_json::Value;
use std::sync::Arc;

/// Logical routes of the application under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    /// Global feed
    Home,
    /// Sign-in form
    Login,
    /// Sign-up form
    Register,
    /// User settings
    Settings,
    /// Article editor
    Editor,
}

impl AppRoute {
    /// Logical name used as the route-table key
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Login => "login",
            Self::Register => "register",
            Self::Settings => "settings",
            Self::Editor => "editor",
        }
    }
}

fn default_routes() -> RouteTable {
    RouteTable::new()
        .with_route(AppRoute::Home.name(), "/")
        .with_route(AppRoute::Login.name(), "/login")
        .with_route(AppRoute::Register.name(), "/register")
        .with_route(AppRoute::Settings.name(), "/settings")
        .with_route(AppRoute::Editor.name(), "/editor")
}

/// Page object for the Conduit demo application.
pub struct ConduitPage<D: PageDriver> {
    driver: D,
    interceptor: Arc<Interceptor>,
    routes: RouteTable,
}

impl<D: PageDriver> std::fmt::Debug for ConduitPage<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConduitPage")
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver> ConduitPage<D> {
    /// Create a page object over a driver and controller
    #[must_use]
    pub fn new(driver: D, interceptor: Arc<Interceptor>) -> Self {
        Self {
            driver,
            interceptor,
            routes: default_routes(),
        }
    }

    /// Replace the route table
    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// The underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The interception controller
    #[must_use]
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Navigate to a logical route (30 s, wait-until-load)
    pub async fn goto(&self, route: AppRoute) -> DesviarResult<()> {
        goto_route(&self.driver, &self.routes, route.name()).await
    }

    /// Register an interception rule; the handle must be awaited separately
    pub fn intercept(
        &self,
        method: HttpMethod,
        matcher: impl Into<UrlMatcher>,
        options: InterceptOptions,
    ) -> WaitHandle {
        self.interceptor.register(method, matcher, options)
    }

    /// Load and parse a fixture document
    pub fn fixture(&self, name: &str) -> DesviarResult<Value> {
        self.interceptor.fixture(name)
    }

    /// Log in through the UI with a mocked backend.
    ///
    /// Loads `user.json`, overrides the username, mocks the login endpoint
    /// with it, submits the form while awaiting the response, and asserts
    /// the page landed on the home route.
    pub async fn login(&self, username: &str) -> DesviarResult<()> {
        step::run_boxed_step("Conduit.login", async {
            let mut user = self.fixture("user.json")?;
            if let Some(slot) = user.pointer_mut("/user/username") {
                *slot = Value::String(username.to_string());
            }

            self.goto(AppRoute::Login).await?;
            self.driver
                .fill_by_placeholder("Email", "foo@example.com")
                .await?;
            self.driver
                .fill_by_placeholder("Password", "12345678")
                .await?;

            // Mock installed before the click: no race between the form
            // submission and the rule's existence.
            let wait_for_login = self.intercept(
                HttpMethod::Post,
                UrlMatcher::pattern(r"users/login$")?,
                InterceptOptions::new().with_status(200).with_body(user),
            );
            let (response, ()) = tokio::try_join!(
                wait_for_login.wait(),
                self.driver.click_button("Sign in"),
            )?;
            tracing::debug!(status = response.status(), "login response observed");

            let url = self.driver.current_url().await;
            let home = self
                .routes
                .resolve(AppRoute::Home.name())
                .ok_or_else(|| DesviarError::NavigationError {
                    url: AppRoute::Home.name().to_string(),
                    message: "unknown route".to_string(),
                })?;
            assertion::expect_url(&url, home)
        })
        .await
    }

    /// Assert the page body contains `text`
    pub async fn contains_text(&self, text: &str) -> DesviarResult<()> {
        step::run_step("Conduit.contains_text", async {
            assertion::expect_contains_text(&self.driver.body_text().await, text)
        })
        .await
    }
}
