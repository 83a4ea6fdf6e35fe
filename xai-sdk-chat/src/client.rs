//! Entry point for chat sessions and stored/deferred completions.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use xai_sdk_core::messages::{
    DeleteStoredCompletionRequest, GetChatCompletionResponse, GetCompletionsRequest,
    GetDeferredCompletionResponse, GetDeferredRequest, GetStoredCompletionRequest,
    StartDeferredResponse,
};
use xai_sdk_core::{CallContext, ChatService, Result};

use crate::options::ChatOption;
use crate::session::ChatSession;

/// Creates [`ChatSession`]s and exposes the stored and deferred RPCs.
#[derive(Clone)]
pub struct ChatClient {
    service: Arc<dyn ChatService>,
}

impl ChatClient {
    /// Wrap a chat service (usually the layered transport).
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }

    /// Start a session for `model`, applying `options` in order.
    pub fn create(
        &self,
        model: impl Into<String>,
        options: impl IntoIterator<Item = ChatOption>,
    ) -> ChatSession {
        ChatSession::new(Arc::clone(&self.service), model, options)
    }

    /// Fetch a stored completion by response id.
    pub async fn get_stored_completion(
        &self,
        ctx: &CallContext,
        response_id: impl Into<String>,
    ) -> Result<GetChatCompletionResponse> {
        let request = GetStoredCompletionRequest {
            response_id: response_id.into(),
        };
        Ok(self.service.get_stored_completion(ctx, request).await?)
    }

    /// Delete a stored completion by response id.
    pub async fn delete_stored_completion(
        &self,
        ctx: &CallContext,
        response_id: impl Into<String>,
    ) -> Result<()> {
        let request = DeleteStoredCompletionRequest {
            response_id: response_id.into(),
        };
        let deleted = self.service.delete_stored_completion(ctx, request).await?;
        debug!(response_id = %deleted.response_id, "stored completion deleted");
        Ok(())
    }

    /// Start a deferred completion without polling it.
    pub async fn start_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<StartDeferredResponse> {
        request.validate()?;
        Ok(self.service.start_deferred_completion(ctx, request).await?)
    }

    /// Poll a deferred completion once.
    pub async fn get_deferred_completion(
        &self,
        ctx: &CallContext,
        request_id: impl Into<String>,
    ) -> Result<GetDeferredCompletionResponse> {
        let request = GetDeferredRequest {
            request_id: request_id.into(),
        };
        Ok(self.service.get_deferred_completion(ctx, request).await?)
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChatService;
    use crate::options::{with_conversation_id, with_messages, with_temperature};
    use pretty_assertions::assert_eq;
    use xai_sdk_core::messages::user;
    use xai_sdk_core::{Code, XaiError};

    #[test]
    fn test_create_applies_options() {
        let client = ChatClient::new(Arc::new(MockChatService::new()));
        let session = client.create(
            "grok-4",
            [
                with_messages([user("hi")]),
                with_temperature(0.2),
                with_conversation_id("conv-1"),
            ],
        );

        assert_eq!(session.request().model, "grok-4");
        assert_eq!(session.request().temperature, Some(0.2));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.conversation_id(), Some("conv-1"));
    }

    #[tokio::test]
    async fn test_stored_completion_pass_through() {
        let mock = MockChatService::new().with_stored(GetChatCompletionResponse {
            id: "resp-1".into(),
            ..GetChatCompletionResponse::default()
        });
        let client = ChatClient::new(Arc::new(mock.clone()));
        let ctx = CallContext::new();

        let stored = client.get_stored_completion(&ctx, "resp-1").await.unwrap();
        assert_eq!(stored.id, "resp-1");

        let err = client.get_stored_completion(&ctx, "resp-2").await.unwrap_err();
        assert_eq!(err.code(), Some(Code::NotFound));

        client.delete_stored_completion(&ctx, "resp-1").await.unwrap();
        assert_eq!(mock.deleted_ids(), vec!["resp-1".to_string()]);
    }

    #[tokio::test]
    async fn test_deferred_pass_through() {
        let mock = MockChatService::new();
        let client = ChatClient::new(Arc::new(mock.clone()));
        let ctx = CallContext::new();

        let err = client
            .start_deferred_completion(&ctx, GetCompletionsRequest::new("grok-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, XaiError::Validation(_)));

        let mut request = GetCompletionsRequest::new("grok-4");
        request.messages.push(user("hi"));
        let started = client.start_deferred_completion(&ctx, request).await.unwrap();
        assert_eq!(started.request_id, "deferred-1");

        let poll = client
            .get_deferred_completion(&ctx, started.request_id)
            .await
            .unwrap();
        assert_eq!(poll, GetDeferredCompletionResponse::pending());
        assert_eq!(mock.poll_count(), 1);
    }
}
