//! The top-level client.

use std::sync::Arc;
use tracing::debug;
use xai_sdk_chat::ChatClient;
use xai_sdk_core::{ChatService, Result};
use xai_sdk_retries::RetryService;

use crate::config::ClientOptions;
use crate::interceptor::{AuthLayer, TimeoutLayer};

/// Client for the xAI API.
///
/// The transport is any [`ChatService`], typically a generated gRPC stub
/// connected to [`ClientOptions::api_endpoint`]. Every call goes through the
/// default deadline, then authentication, then retries:
///
/// ```text
/// TimeoutLayer -> AuthLayer -> RetryService -> transport
/// ```
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use xai_sdk::{Client, ClientOptions};
/// use xai_sdk::chat::mock::MockChatService;
/// use xai_sdk::chat::ChatOption;
///
/// let client = Client::new(
///     Arc::new(MockChatService::new()),
///     ClientOptions::default().with_api_key("xai-..."),
/// )
/// .unwrap();
///
/// let session = client.chat().create("grok-4", Vec::<ChatOption>::new());
/// assert_eq!(session.request().model, "grok-4");
/// ```
#[derive(Clone)]
pub struct Client {
    options: ClientOptions,
    chat: ChatClient,
}

impl Client {
    /// Layer `transport` according to `options`.
    ///
    /// Fails with a validation error when no API key is configured.
    pub fn new(transport: Arc<dyn ChatService>, options: ClientOptions) -> Result<Self> {
        let api_key = options.require_api_key()?;

        let retried: Arc<dyn ChatService> =
            Arc::new(RetryService::new(transport, options.retry.clone()));

        let mut auth = AuthLayer::new(retried, api_key).with_metadata(&options.metadata);
        if let Some(user_agent) = &options.user_agent {
            auth = auth.with_metadata([("user-agent", user_agent)]);
        }

        let service: Arc<dyn ChatService> =
            Arc::new(TimeoutLayer::new(Arc::new(auth), options.timeout));

        debug!(
            api_host = %options.api_host,
            timeout = ?options.timeout,
            max_attempts = options.retry.max_attempts,
            "xai client created"
        );

        Ok(Self {
            options,
            chat: ChatClient::new(service),
        })
    }

    /// Build from the environment (`XAI_API_KEY`).
    pub fn from_env(transport: Arc<dyn ChatService>) -> Result<Self> {
        Self::new(transport, ClientOptions::from_env())
    }

    /// The chat client.
    pub fn chat(&self) -> &ChatClient {
        &self.chat
    }

    /// The options this client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use xai_sdk_chat::mock::MockChatService;
    use xai_sdk_chat::ChatOption;
    use xai_sdk_core::messages::{
        user, CompletionMessage, CompletionOutput, DeleteStoredCompletionRequest,
        DeleteStoredCompletionResponse, FinishReason, GetChatCompletionResponse,
        GetCompletionsRequest, GetDeferredCompletionResponse, GetDeferredRequest,
        GetStoredCompletionRequest, MessageRole, StartDeferredResponse,
    };
    use xai_sdk_core::{CallContext, ChunkStream, Code, Status, XaiError};
    use xai_sdk_retries::RetryConfig;

    /// Fails the first `failures` unary calls with `UNAVAILABLE`, recording metadata.
    struct Unstable {
        failures: Mutex<u32>,
        seen: Mutex<Vec<CallContext>>,
        reply: GetChatCompletionResponse,
    }

    #[async_trait]
    impl ChatService for Unstable {
        async fn get_completion(
            &self,
            ctx: &CallContext,
            _request: GetCompletionsRequest,
        ) -> std::result::Result<GetChatCompletionResponse, Status> {
            self.seen.lock().push(ctx.clone());
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(Status::unavailable("try again"));
            }
            Ok(self.reply.clone())
        }

        async fn get_completion_chunk(
            &self,
            _ctx: &CallContext,
            _request: GetCompletionsRequest,
        ) -> std::result::Result<Box<dyn ChunkStream>, Status> {
            Err(Status::unimplemented("stream"))
        }

        async fn start_deferred_completion(
            &self,
            _ctx: &CallContext,
            _request: GetCompletionsRequest,
        ) -> std::result::Result<StartDeferredResponse, Status> {
            Err(Status::unimplemented("deferred"))
        }

        async fn get_deferred_completion(
            &self,
            _ctx: &CallContext,
            _request: GetDeferredRequest,
        ) -> std::result::Result<GetDeferredCompletionResponse, Status> {
            Err(Status::unimplemented("deferred"))
        }

        async fn get_stored_completion(
            &self,
            _ctx: &CallContext,
            _request: GetStoredCompletionRequest,
        ) -> std::result::Result<GetChatCompletionResponse, Status> {
            Err(Status::unimplemented("stored"))
        }

        async fn delete_stored_completion(
            &self,
            _ctx: &CallContext,
            _request: DeleteStoredCompletionRequest,
        ) -> std::result::Result<DeleteStoredCompletionResponse, Status> {
            Err(Status::unimplemented("stored"))
        }
    }

    fn reply(text: &str) -> GetChatCompletionResponse {
        GetChatCompletionResponse {
            id: "resp-1".into(),
            model: "grok-4".into(),
            outputs: vec![CompletionOutput {
                index: 0,
                finish_reason: FinishReason::Stop,
                message: CompletionMessage {
                    role: MessageRole::Assistant,
                    content: text.into(),
                    ..CompletionMessage::default()
                },
            }],
            ..GetChatCompletionResponse::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let err = Client::new(Arc::new(MockChatService::new()), ClientOptions::default())
            .unwrap_err();
        assert!(matches!(err, XaiError::Validation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_layers_compose() {
        let transport = Arc::new(Unstable {
            failures: Mutex::new(2),
            seen: Mutex::new(Vec::new()),
            reply: reply("Paris"),
        });
        let options = ClientOptions::default()
            .with_api_key("secret")
            .with_metadata([("x-team", "infra")])
            .with_user_agent("my-app/1.0")
            .with_timeout(Duration::from_secs(60))
            .with_retry(RetryConfig::new().fixed(Duration::from_millis(10)));
        let client = Client::new(transport.clone(), options).unwrap();

        let mut session = client.chat().create("grok-4", Vec::<ChatOption>::new());
        session.append(user("Capital of France?"));
        let response = session.sample(&CallContext::new()).await.unwrap();

        assert_eq!(response.content(), "Paris");
        let seen = transport.seen.lock();
        assert_eq!(seen.len(), 3);
        for ctx in seen.iter() {
            assert_eq!(ctx.metadata_value("authorization"), Some("Bearer secret"));
            assert_eq!(ctx.metadata_value("x-team"), Some("infra"));
            assert_eq!(ctx.metadata_value("user-agent"), Some("my-app/1.0"));
            assert!(ctx.deadline().is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_surfaces() {
        let transport = Arc::new(
            MockChatService::new().with_completion_error(Status::invalid_argument("bad model")),
        );
        let client = Client::new(
            transport.clone(),
            ClientOptions::default().with_api_key("k"),
        )
        .unwrap();

        let mut session = client.chat().create("grok-bad", Vec::<ChatOption>::new());
        session.append(user("hi"));
        let err = session.sample(&CallContext::new()).await.unwrap_err();

        assert_eq!(err.code(), Some(Code::InvalidArgument));
        assert_eq!(transport.recorded_requests().len(), 1);
    }
}
