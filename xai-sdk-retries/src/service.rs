//! A [`ChatService`] layer that retries failed calls.

use async_trait::async_trait;
use std::sync::Arc;
use xai_sdk_core::messages::{
    DeleteStoredCompletionRequest, DeleteStoredCompletionResponse, GetChatCompletionResponse,
    GetCompletionsRequest, GetDeferredCompletionResponse, GetDeferredRequest,
    GetStoredCompletionRequest, StartDeferredResponse,
};
use xai_sdk_core::{CallContext, ChatService, ChunkStream, Status};

use crate::config::RetryConfig;
use crate::executor::with_retry;

/// Retries unary calls and stream establishment according to a [`RetryConfig`].
///
/// Once a stream has been opened its failures are surfaced to the caller;
/// a partially consumed stream is never replayed.
#[derive(Clone)]
pub struct RetryService {
    inner: Arc<dyn ChatService>,
    config: RetryConfig,
}

impl RetryService {
    /// Wrap `inner` with the given policy.
    pub fn new(inner: Arc<dyn ChatService>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The retry policy.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl std::fmt::Debug for RetryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatService for RetryService {
    async fn get_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        with_retry(&self.config, ctx, || {
            self.inner.get_completion(ctx, request.clone())
        })
        .await
    }

    async fn get_completion_chunk(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<Box<dyn ChunkStream>, Status> {
        with_retry(&self.config, ctx, || {
            self.inner.get_completion_chunk(ctx, request.clone())
        })
        .await
    }

    async fn start_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<StartDeferredResponse, Status> {
        with_retry(&self.config, ctx, || {
            self.inner.start_deferred_completion(ctx, request.clone())
        })
        .await
    }

    async fn get_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetDeferredRequest,
    ) -> Result<GetDeferredCompletionResponse, Status> {
        with_retry(&self.config, ctx, || {
            self.inner.get_deferred_completion(ctx, request.clone())
        })
        .await
    }

    async fn get_stored_completion(
        &self,
        ctx: &CallContext,
        request: GetStoredCompletionRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        with_retry(&self.config, ctx, || {
            self.inner.get_stored_completion(ctx, request.clone())
        })
        .await
    }

    async fn delete_stored_completion(
        &self,
        ctx: &CallContext,
        request: DeleteStoredCompletionRequest,
    ) -> Result<DeleteStoredCompletionResponse, Status> {
        with_retry(&self.config, ctx, || {
            self.inner.delete_stored_completion(ctx, request.clone())
        })
        .await
    }
}
