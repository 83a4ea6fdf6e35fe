//! Per-call layers wrapped around the transport.
//!
//! [`AuthLayer`] stamps outgoing metadata on every call. [`TimeoutLayer`]
//! gives calls without a deadline the client default, and scopes a streamed
//! call to the life of its stream.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use xai_sdk_core::messages::{
    DeleteStoredCompletionRequest, DeleteStoredCompletionResponse, GetChatCompletionChunk,
    GetChatCompletionResponse, GetCompletionsRequest, GetDeferredCompletionResponse,
    GetDeferredRequest, GetStoredCompletionRequest, StartDeferredResponse,
};
use xai_sdk_core::{CallContext, ChatService, ChunkStream, Status, SDK_LANGUAGE, SDK_VERSION};

/// Metadata key carrying the SDK version.
pub const SDK_VERSION_HEADER: &str = "xai-sdk-version";

/// Metadata key carrying the SDK language.
pub const SDK_LANGUAGE_HEADER: &str = "xai-sdk-language";

/// Adds the bearer token, static metadata and SDK identification to every call.
///
/// Entries already present on the caller's context are overwritten.
#[derive(Clone)]
pub struct AuthLayer {
    inner: Arc<dyn ChatService>,
    headers: IndexMap<String, String>,
}

impl AuthLayer {
    /// Wrap `inner`, authenticating with `token`.
    pub fn new(inner: Arc<dyn ChatService>, token: impl AsRef<str>) -> Self {
        let mut headers = IndexMap::new();
        headers.insert(
            "authorization".to_string(),
            format!("Bearer {}", token.as_ref()),
        );
        headers.insert(SDK_VERSION_HEADER.to_string(), SDK_VERSION.to_string());
        headers.insert(SDK_LANGUAGE_HEADER.to_string(), SDK_LANGUAGE.to_string());
        Self { inner, headers }
    }

    /// Also send `metadata` on every call.
    #[must_use]
    pub fn with_metadata<K, V>(mut self, metadata: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in metadata {
            self.headers
                .insert(key.as_ref().to_ascii_lowercase(), value.as_ref().to_string());
        }
        self
    }

    fn stamp(&self, ctx: &CallContext) -> CallContext {
        let mut ctx = ctx.clone();
        for (key, value) in &self.headers {
            ctx.insert_metadata(key.as_str(), value.as_str());
        }
        ctx
    }
}

impl std::fmt::Debug for AuthLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        f.debug_struct("AuthLayer")
            .field("headers", &keys)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatService for AuthLayer {
    async fn get_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        self.inner.get_completion(&self.stamp(ctx), request).await
    }

    async fn get_completion_chunk(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<Box<dyn ChunkStream>, Status> {
        self.inner.get_completion_chunk(&self.stamp(ctx), request).await
    }

    async fn start_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<StartDeferredResponse, Status> {
        self.inner
            .start_deferred_completion(&self.stamp(ctx), request)
            .await
    }

    async fn get_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetDeferredRequest,
    ) -> Result<GetDeferredCompletionResponse, Status> {
        self.inner
            .get_deferred_completion(&self.stamp(ctx), request)
            .await
    }

    async fn get_stored_completion(
        &self,
        ctx: &CallContext,
        request: GetStoredCompletionRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        self.inner
            .get_stored_completion(&self.stamp(ctx), request)
            .await
    }

    async fn delete_stored_completion(
        &self,
        ctx: &CallContext,
        request: DeleteStoredCompletionRequest,
    ) -> Result<DeleteStoredCompletionResponse, Status> {
        self.inner
            .delete_stored_completion(&self.stamp(ctx), request)
            .await
    }
}

/// Applies a default deadline to calls whose context has none.
///
/// A zero timeout disables the default. Streamed calls run under a child
/// context that is cancelled once the stream is half-closed, fails, ends,
/// or is dropped.
#[derive(Clone)]
pub struct TimeoutLayer {
    inner: Arc<dyn ChatService>,
    timeout: Duration,
}

impl TimeoutLayer {
    /// Wrap `inner` with a default deadline of `timeout`.
    pub fn new(inner: Arc<dyn ChatService>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The default deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn bounded(&self, ctx: &CallContext) -> CallContext {
        if ctx.deadline().is_none() && !self.timeout.is_zero() {
            ctx.clone().with_timeout(self.timeout)
        } else {
            ctx.clone()
        }
    }
}

impl std::fmt::Debug for TimeoutLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutLayer")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatService for TimeoutLayer {
    async fn get_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        let ctx = self.bounded(ctx);
        ctx.run(self.inner.get_completion(&ctx, request)).await
    }

    async fn get_completion_chunk(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<Box<dyn ChunkStream>, Status> {
        let ctx = self.bounded(ctx).child();
        let token = ctx.cancellation().clone();
        match ctx.run(self.inner.get_completion_chunk(&ctx, request)).await {
            Ok(stream) => Ok(Box::new(CancelOnClose::new(stream, token))),
            Err(status) => {
                token.cancel();
                Err(status)
            }
        }
    }

    async fn start_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<StartDeferredResponse, Status> {
        let ctx = self.bounded(ctx);
        ctx.run(self.inner.start_deferred_completion(&ctx, request))
            .await
    }

    async fn get_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetDeferredRequest,
    ) -> Result<GetDeferredCompletionResponse, Status> {
        let ctx = self.bounded(ctx);
        ctx.run(self.inner.get_deferred_completion(&ctx, request))
            .await
    }

    async fn get_stored_completion(
        &self,
        ctx: &CallContext,
        request: GetStoredCompletionRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        let ctx = self.bounded(ctx);
        ctx.run(self.inner.get_stored_completion(&ctx, request))
            .await
    }

    async fn delete_stored_completion(
        &self,
        ctx: &CallContext,
        request: DeleteStoredCompletionRequest,
    ) -> Result<DeleteStoredCompletionResponse, Status> {
        let ctx = self.bounded(ctx);
        ctx.run(self.inner.delete_stored_completion(&ctx, request))
            .await
    }
}

/// Cancels the stream's child token exactly once when the stream is done with.
struct CancelOnClose {
    inner: Box<dyn ChunkStream>,
    token: CancellationToken,
}

impl CancelOnClose {
    fn new(inner: Box<dyn ChunkStream>, token: CancellationToken) -> Self {
        Self { inner, token }
    }
}

#[async_trait]
impl ChunkStream for CancelOnClose {
    async fn message(&mut self) -> Result<Option<GetChatCompletionChunk>, Status> {
        let next = self.inner.message().await;
        if !matches!(next, Ok(Some(_))) {
            self.token.cancel();
        }
        next
    }

    fn close_send(&mut self) {
        self.inner.close_send();
        self.token.cancel();
    }
}

impl Drop for CancelOnClose {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
