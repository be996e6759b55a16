//! Step runtime: named scopes around page-object operations.
//!
//! A step labels an async operation for reporting; a boxed step additionally
//! attributes any failure inside it to the outer step name, hiding internal
//! call sites. Values and errors pass through unchanged: steps are pure
//! decoration, with no state and no concurrency concerns.
//!
//! The `#[page_steps]` attribute from the companion derive crate generates
//! calls into this module with the step name computed at compile time;
//! callers can also invoke [`run_step`] directly with a constant name.

use std::future::Future;
use std::time::Instant;
use tracing::Instrument;

tokio::task_local! {
    static IN_BOXED_STEP: bool;
}

/// Whether the current task is inside a boxed step scope.
///
/// Inner steps check this to keep their own reporting quiet; failures then
/// surface only under the outer step's name.
#[must_use]
pub fn in_boxed_scope() -> bool {
    IN_BOXED_STEP.try_with(|boxed| *boxed).unwrap_or(false)
}

/// Run an operation as a named step.
///
/// The returned value and any error pass through unchanged.
pub async fn run_step<F, T, E>(name: &str, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let span = tracing::info_span!("step", name);
    let suppressed = in_boxed_scope();
    let start = Instant::now();
    let result = future.instrument(span).await;
    report(name, suppressed, start, &result);
    result
}

/// Run an operation as a boxed step.
///
/// Identical to [`run_step`], except steps nested inside report nothing of
/// their own: a failure anywhere in the body is attributed to `name`.
pub async fn run_boxed_step<F, T, E>(name: &str, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let span = tracing::info_span!("step", name, boxed = true);
    let suppressed = in_boxed_scope();
    let start = Instant::now();
    let result = IN_BOXED_STEP.scope(true, future).instrument(span).await;
    report(name, suppressed, start, &result);
    result
}

fn report<T, E: std::fmt::Display>(
    name: &str,
    suppressed: bool,
    start: Instant,
    result: &Result<T, E>,
) {
    if suppressed {
        return;
    }
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(_) => tracing::debug!(step = name, elapsed_ms, "step passed"),
        Err(error) => tracing::error!(step = name, %error, "step failed"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::result::DesviarError;

    #[tokio::test]
    async fn test_value_passes_through() {
        let value = run_step("Conduit.open", async { Ok::<_, DesviarError>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_error_passes_through() {
        let err = run_step("Conduit.open", async {
            Err::<(), _>(DesviarError::AssertionFailed {
                message: "nope".to_string(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DesviarError::AssertionFailed { .. }));
    }

    #[tokio::test]
    async fn test_boxed_scope_is_visible_inside() {
        assert!(!in_boxed_scope());
        let observed = run_boxed_step("Conduit.login", async {
            Ok::<_, DesviarError>(in_boxed_scope())
        })
        .await
        .unwrap();
        assert!(observed);
        assert!(!in_boxed_scope());
    }

    #[tokio::test]
    async fn test_plain_step_does_not_open_boxed_scope() {
        let observed = run_step("Conduit.open", async {
            Ok::<_, DesviarError>(in_boxed_scope())
        })
        .await
        .unwrap();
        assert!(!observed);
    }

    #[tokio::test]
    async fn test_nested_step_inside_boxed_passes_value() {
        let value = run_boxed_step("Conduit.login", async {
            run_step("Conduit.goto", async { Ok::<_, DesviarError>("home") }).await
        })
        .await
        .unwrap();
        assert_eq!(value, "home");
    }

    #[tokio::test]
    async fn test_boxed_step_propagates_inner_failure() {
        let err = run_boxed_step("Conduit.login", async {
            run_step("Conduit.goto", async {
                Err::<(), _>(DesviarError::AssertionFailed {
                    message: "inner".to_string(),
                })
            })
            .await
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DesviarError::AssertionFailed { .. }));
    }
}
