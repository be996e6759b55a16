//! Response waits: single-use handles for "the next response matching X".
//!
//! Registration and waiting are deliberately two phases: the mock and the
//! response subscription are installed first, the triggering action runs
//! after, and the handle is awaited last. A response that fires immediately
//! after the trigger therefore cannot be missed.

use crate::http::HttpMethod;
use crate::matcher::UrlMatcher;
use crate::result::{DesviarError, DesviarResult};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::broadcast;

/// Default window for awaiting a matching response (4 seconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 4_000;

/// A network response observed on the page.
#[derive(Debug, Clone)]
pub struct ObservedResponse {
    method: HttpMethod,
    url: String,
    status: u16,
    body: Vec<u8>,
}

impl ObservedResponse {
    /// Create a new observed response
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>, status: u16, body: Vec<u8>) -> Self {
        Self {
            method,
            url: url.into(),
            status,
            body,
        }
    }

    /// Method of the request that produced this response
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// URL of the request that produced this response
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP status code
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response body bytes
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parse the body as JSON
    pub fn body_json<T: DeserializeOwned>(&self) -> DesviarResult<T> {
        let value = serde_json::from_slice(&self.body)?;
        Ok(value)
    }
}

/// Predicate selecting the response a wait handle resolves to.
///
/// A response matches when its request method equals the registered method
/// AND its URL satisfies the registered matcher. A non-matching response that
/// arrives first is skipped, never resolved to.
#[derive(Debug, Clone)]
pub struct ResponsePredicate {
    method: HttpMethod,
    matcher: UrlMatcher,
}

impl ResponsePredicate {
    /// Create a predicate from a rule's method and matcher
    #[must_use]
    pub fn new(method: HttpMethod, matcher: UrlMatcher) -> Self {
        Self { method, matcher }
    }

    /// Check whether a response satisfies the predicate
    #[must_use]
    pub fn matches(&self, response: &ObservedResponse) -> bool {
        response.method() == self.method && self.matcher.matches(response.url())
    }
}

/// Single-use completion token returned from rule registration.
///
/// Resolves to the first observed response satisfying the predicate, or fails
/// with [`DesviarError::ResponseTimeout`] once the window elapses. The
/// timeout is a hard cancellation: no retry, and the installed interception
/// rule stays active for future requests.
pub struct WaitHandle {
    receiver: broadcast::Receiver<ObservedResponse>,
    predicate: ResponsePredicate,
    timeout: Duration,
}

impl std::fmt::Debug for WaitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitHandle")
            .field("predicate", &self.predicate)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl WaitHandle {
    pub(crate) fn new(
        receiver: broadcast::Receiver<ObservedResponse>,
        predicate: ResponsePredicate,
        timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            predicate,
            timeout,
        }
    }

    /// The configured wait window
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Await the first matching response.
    ///
    /// Consumes the handle: one registration, one await, one resolution or
    /// timeout.
    ///
    /// # Errors
    ///
    /// `ResponseTimeout` if no matching response arrives within the window;
    /// `PageError` if the response stream closed before a match.
    pub async fn wait(mut self) -> DesviarResult<ObservedResponse> {
        let ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let predicate = self.predicate.clone();
        tokio::time::timeout(self.timeout, async move {
            loop {
                match self.receiver.recv().await {
                    Ok(response) if predicate.matches(&response) => {
                        tracing::debug!(
                            url = response.url(),
                            status = response.status(),
                            "matching response observed"
                        );
                        return Ok(response);
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(DesviarError::PageError {
                            message: "response stream closed before a match".to_string(),
                        });
                    }
                }
            }
        })
        .await
        .map_err(|_| DesviarError::ResponseTimeout { ms })?
    }
}
