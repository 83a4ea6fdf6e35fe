//! Retry executor for running RPCs with retries.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use xai_sdk_core::{CallContext, Status};

use crate::config::RetryConfig;

/// State of a retry loop.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Current attempt number (1-indexed).
    pub attempt: u32,
    /// Total time spent waiting.
    pub total_wait_time: Duration,
}

/// Run `operation` until it succeeds, fails with a non-retryable status, or
/// the attempt budget is spent.
///
/// Backoff sleeps end early when `ctx` is cancelled, and no retry is
/// scheduled past the context deadline.
///
/// # Example
///
/// ```ignore
/// use xai_sdk_retries::{with_retry, RetryConfig};
///
/// let response = with_retry(&RetryConfig::default(), &ctx, || {
///     inner.get_completion(&ctx, request.clone())
/// })
/// .await?;
/// ```
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    ctx: &CallContext,
    operation: F,
) -> Result<T, Status>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Status>>,
{
    with_retry_state(config, ctx, operation).await.0
}

/// Like [`with_retry`], also returning the final loop state.
pub async fn with_retry_state<F, Fut, T>(
    config: &RetryConfig,
    ctx: &CallContext,
    operation: F,
) -> (Result<T, Status>, RetryState)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Status>>,
{
    let mut state = RetryState::default();
    let max_attempts = config.max_attempts.max(1);

    loop {
        state.attempt += 1;

        debug!(attempt = state.attempt, max_attempts, "Executing RPC attempt");

        let status = match operation().await {
            Ok(result) => return (Ok(result), state),
            Err(status) => status,
        };

        let wait = config.wait.calculate(state.attempt);
        let past_deadline = ctx.remaining().is_some_and(|left| left <= wait);
        let should_retry = state.attempt < max_attempts
            && config.retry_on.should_retry(&status)
            && !past_deadline;

        if !should_retry {
            warn!(
                attempt = state.attempt,
                code = ?status.code(),
                error = %status.message(),
                "Retry exhausted or error not retryable"
            );
            return (Err(status), state);
        }

        debug!(
            attempt = state.attempt,
            wait_ms = wait.as_millis(),
            code = ?status.code(),
            "Waiting before retry"
        );

        tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => {
                return (Err(Status::cancelled("call cancelled during retry backoff")), state);
            }
            _ = sleep(wait) => {}
        }
        state.total_wait_time += wait;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetryCondition, WaitStrategy};
    use std::sync::atomic::{AtomicU32, Ordering};
    use xai_sdk_core::Code;

    fn fast_config() -> RetryConfig {
        RetryConfig::default().fixed(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let ctx = CallContext::new();

        let (result, state) = with_retry_state(&fast_config(), &ctx, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Status::unavailable("down"))
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(state.attempt, 3);
        assert_eq!(state.total_wait_time, Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_budget() {
        let calls = AtomicU32::new(0);
        let ctx = CallContext::new();

        let result: Result<(), Status> = with_retry(&fast_config(), &ctx, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Status::unavailable("down"))
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Code::Unavailable);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_fast() {
        let calls = AtomicU32::new(0);
        let ctx = CallContext::new();

        let result: Result<(), Status> = with_retry(&fast_config(), &ctx, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Status::invalid_argument("bad"))
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Code::InvalidArgument);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_backoff() {
        let ctx = CallContext::new();
        let config = RetryConfig::default().fixed(Duration::from_secs(60));
        let token = ctx.cancellation().clone();

        let handle = tokio::spawn({
            let ctx = ctx.clone();
            async move {
                with_retry(&config, &ctx, || async {
                    Err::<(), _>(Status::unavailable("down"))
                })
                .await
            }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        let result = handle.await.unwrap();
        assert_eq!(result.unwrap_err().code(), Code::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_past_deadline() {
        let calls = AtomicU32::new(0);
        let ctx = CallContext::new().with_timeout(Duration::from_millis(50));
        let config = RetryConfig::default()
            .wait(WaitStrategy::Fixed(Duration::from_millis(100)))
            .retry_on(RetryCondition::default());

        let result: Result<(), Status> = with_retry(&config, &ctx, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Status::unavailable("down"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
