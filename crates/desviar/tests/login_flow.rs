//! End-to-end login scenario driven through the in-memory engine.

use desviar::{
    ButtonScript, ConduitPage, DesviarError, FixtureDir, HttpMethod, InterceptOptions,
    Interceptor, InterceptorConfig, PageDriver, SimPage, UrlMatcher,
};
use serde_json::Value;
use std::fs;
use std::sync::Arc;

const USER_FIXTURE: &str = r#"{
  "user": {
    "email": "foo@example.com",
    "token": "jwt.token.here",
    "username": "plumrx",
    "bio": null,
    "image": "https://api.realworld.io/images/smiley-cyrus.jpeg"
  }
}"#;

const LOGIN_URL: &str = "https://conduit.example/api/users/login";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness() -> (tempfile::TempDir, Arc<Interceptor>, ConduitPage<SimPage>) {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("user.json"), USER_FIXTURE).expect("write fixture");

    let interceptor = Arc::new(Interceptor::new(InterceptorConfig::new(FixtureDir::new(
        dir.path(),
    ))));
    let page = SimPage::new(Arc::clone(&interceptor));
    page.script_button(
        "Sign in",
        ButtonScript::new(HttpMethod::Post, LOGIN_URL).then_navigate("/"),
    );
    let conduit = ConduitPage::new(page, Arc::clone(&interceptor));
    (dir, interceptor, conduit)
}

#[tokio::test]
async fn login_mocks_the_backend_and_lands_on_home() {
    let (_dir, _interceptor, conduit) = harness();

    conduit.login("plumrx").await.expect("login");

    assert_eq!(conduit.driver().current_url().await, "/");
    conduit.contains_text("plumrx").await.expect("username rendered");
}

#[tokio::test]
async fn registered_mock_echoes_the_provided_user_object() {
    let (_dir, interceptor, conduit) = harness();

    // Register before triggering, await alongside the trigger.
    let wait_for_login = interceptor.register(
        HttpMethod::Post,
        UrlMatcher::pattern(r"users/login$").expect("pattern"),
        InterceptOptions::new()
            .with_status(200)
            .with_body(serde_json::json!({"user": {"username": "plumrx"}})),
    );
    let (response, ()) = tokio::try_join!(
        wait_for_login.wait(),
        conduit.driver().click_button("Sign in"),
    )
    .expect("login round trip");

    assert_eq!(response.status(), 200);
    let body: Value = response.body_json().expect("json body");
    assert_eq!(body["user"]["username"], "plumrx");
    assert_eq!(conduit.driver().current_url().await, "/");
}

#[tokio::test]
async fn wait_handle_times_out_when_nothing_matches() {
    let (_dir, interceptor, _conduit) = harness();

    let handle = interceptor.register(
        HttpMethod::Post,
        UrlMatcher::pattern(r"users/login$").expect("pattern"),
        InterceptOptions::new()
            .with_status(200)
            .with_timeout_ms(50),
    );

    // No triggering action: the await must fail, not hang or resolve empty.
    let err = handle.wait().await.expect_err("timeout");
    assert!(matches!(err, DesviarError::ResponseTimeout { ms: 50 }));
}

#[tokio::test]
async fn source_module_requests_are_never_mocked() {
    let (_dir, interceptor, conduit) = harness();

    let _handle = interceptor.register(
        HttpMethod::Get,
        "/src/",
        InterceptOptions::new().with_body(serde_json::json!({"mocked": true})),
    );
    conduit.driver().script_backend(
        HttpMethod::Get,
        "/src/app.ts",
        200,
        b"export {}".to_vec(),
    );

    let response = conduit
        .driver()
        .issue_request(HttpMethod::Get, "https://conduit.example/src/app.ts")
        .expect("request");
    assert_eq!(response.body(), b"export {}");
}
