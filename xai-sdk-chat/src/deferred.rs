//! Polling for deferred completions.
//!
//! A deferred completion is started with one RPC and then polled until the
//! server reports `DONE` or `EXPIRED`, or until the client-side timeout
//! passes. Polling stops early if the call context is cancelled.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use xai_sdk_core::messages::{
    DeferredStatus, GetChatCompletionResponse, GetCompletionsRequest, GetDeferredRequest,
};
use xai_sdk_core::{CallContext, ChatService, Result, XaiError};

/// Timeout used when none (or zero) is given.
pub const DEFAULT_DEFERRED_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Poll interval used when none (or zero) is given.
pub const DEFAULT_DEFERRED_INTERVAL: Duration = Duration::from_millis(100);

/// Timeout and poll interval for a deferred completion.
///
/// A zero duration means "use the default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferredOptions {
    /// Give up once this much time has passed since the start call.
    pub timeout: Duration,
    /// Sleep between polls.
    pub interval: Duration,
}

impl DeferredOptions {
    /// Options with an explicit timeout and interval.
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The timeout that will actually be used.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_DEFERRED_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// The interval that will actually be used.
    pub fn effective_interval(&self) -> Duration {
        if self.interval.is_zero() {
            DEFAULT_DEFERRED_INTERVAL
        } else {
            self.interval
        }
    }
}

/// Start `request` as a deferred completion and poll it to completion.
pub(crate) async fn run_deferred(
    service: &dyn ChatService,
    ctx: &CallContext,
    request: GetCompletionsRequest,
    options: DeferredOptions,
) -> Result<GetChatCompletionResponse> {
    let timeout = options.effective_timeout();
    let interval = options.effective_interval();

    let started = service.start_deferred_completion(ctx, request).await?;
    let request_id = started.request_id;
    debug!(%request_id, ?timeout, ?interval, "deferred completion started");

    let deadline = Instant::now() + timeout;
    loop {
        if Instant::now() > deadline {
            return Err(XaiError::DeferredTimeout { timeout });
        }

        let poll = service
            .get_deferred_completion(
                ctx,
                GetDeferredRequest {
                    request_id: request_id.clone(),
                },
            )
            .await?;

        match poll.status {
            DeferredStatus::Done => {
                debug!(%request_id, "deferred completion done");
                return Ok(poll.response.unwrap_or_default());
            }
            DeferredStatus::Expired => {
                return Err(XaiError::DeferredExpired { request_id });
            }
            DeferredStatus::Pending => {
                trace!(%request_id, "deferred completion pending");
                tokio::select! {
                    biased;
                    () = ctx.cancellation().cancelled() => return Err(XaiError::Cancelled),
                    () = tokio::time::sleep(interval) => {}
                }
            }
            DeferredStatus::Invalid => {
                return Err(XaiError::UnknownDeferredStatus(
                    poll.status.as_str_name().to_string(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChatService;
    use pretty_assertions::assert_eq;
    use xai_sdk_core::messages::{user, GetDeferredCompletionResponse};
    use xai_sdk_core::{Code, Status};

    fn request() -> GetCompletionsRequest {
        let mut request = GetCompletionsRequest::new("grok-4");
        request.messages.push(user("hi"));
        request
    }

    fn done(id: &str) -> GetDeferredCompletionResponse {
        GetDeferredCompletionResponse::done(GetChatCompletionResponse {
            id: id.into(),
            ..GetChatCompletionResponse::default()
        })
    }

    #[test]
    fn test_zero_means_default() {
        let options = DeferredOptions::default();
        assert_eq!(options.effective_timeout(), DEFAULT_DEFERRED_TIMEOUT);
        assert_eq!(options.effective_interval(), DEFAULT_DEFERRED_INTERVAL);

        let options = DeferredOptions::new(Duration::from_secs(1), Duration::from_millis(5));
        assert_eq!(options.effective_timeout(), Duration::from_secs(1));
        assert_eq!(options.effective_interval(), Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_done_waits_one_interval() {
        let service = MockChatService::new()
            .with_deferred(GetDeferredCompletionResponse::pending())
            .with_deferred(done("resp-1"));
        let interval = Duration::from_millis(50);

        let start = Instant::now();
        let response = run_deferred(
            &service,
            &CallContext::new(),
            request(),
            DeferredOptions::default().with_interval(interval),
        )
        .await
        .unwrap();

        assert_eq!(response.id, "resp-1");
        assert!(start.elapsed() >= interval);
        assert_eq!(service.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_names_duration() {
        let service = MockChatService::new();
        let timeout = Duration::from_millis(200);

        let start = Instant::now();
        let err = run_deferred(
            &service,
            &CallContext::new(),
            request(),
            DeferredOptions::new(timeout, Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, XaiError::DeferredTimeout { timeout: t } if t == timeout));
        assert_eq!(err.to_string(), "deferred request timed out after 200ms");
        assert!(start.elapsed() >= timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_is_fatal() {
        let service = MockChatService::new().with_deferred(GetDeferredCompletionResponse::expired());

        let err = run_deferred(
            &service,
            &CallContext::new(),
            request(),
            DeferredOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, XaiError::DeferredExpired { ref request_id } if request_id == "deferred-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_is_fatal() {
        let service =
            MockChatService::new().with_deferred(GetDeferredCompletionResponse::default());

        let err = run_deferred(
            &service,
            &CallContext::new(),
            request(),
            DeferredOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, XaiError::UnknownDeferredStatus(ref s) if s == "INVALID_DEFERRED_STATUS"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_is_wrapped() {
        let service =
            MockChatService::new().with_deferred_error(Status::permission_denied("nope"));

        let err = run_deferred(
            &service,
            &CallContext::new(),
            request(),
            DeferredOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), Some(Code::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_between_polls() {
        let service = MockChatService::new();
        let ctx = CallContext::new();
        ctx.cancellation().cancel();

        let err = run_deferred(&service, &ctx, request(), DeferredOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, XaiError::Cancelled));
        assert_eq!(service.poll_count(), 1);
    }
}
