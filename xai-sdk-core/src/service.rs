//! The chat RPC seam.
//!
//! [`ChatService`] is the shape of the generated chat stub. Real transports,
//! the auth / timeout / retry layers, and test doubles all implement it, and
//! layers wrap an inner `Arc<dyn ChatService>`.

use async_trait::async_trait;
use std::sync::Arc;
use tonic::Status;

use crate::context::CallContext;
use crate::messages::{
    DeleteStoredCompletionRequest, DeleteStoredCompletionResponse, GetChatCompletionChunk,
    GetChatCompletionResponse, GetCompletionsRequest, GetDeferredCompletionResponse,
    GetDeferredRequest, GetStoredCompletionRequest, StartDeferredResponse,
};

/// Server-streaming half of `GetCompletionChunk`.
#[async_trait]
pub trait ChunkStream: Send {
    /// Receive the next chunk. `Ok(None)` means the server ended the stream.
    async fn message(&mut self) -> Result<Option<GetChatCompletionChunk>, Status>;

    /// Half-close the client side of the stream.
    fn close_send(&mut self);
}

/// The chat service RPCs.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Unary completion.
    async fn get_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<GetChatCompletionResponse, Status>;

    /// Streamed completion.
    async fn get_completion_chunk(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<Box<dyn ChunkStream>, Status>;

    /// Start a deferred completion.
    async fn start_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<StartDeferredResponse, Status>;

    /// Poll a deferred completion.
    async fn get_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetDeferredRequest,
    ) -> Result<GetDeferredCompletionResponse, Status>;

    /// Fetch a stored completion.
    async fn get_stored_completion(
        &self,
        ctx: &CallContext,
        request: GetStoredCompletionRequest,
    ) -> Result<GetChatCompletionResponse, Status>;

    /// Delete a stored completion.
    async fn delete_stored_completion(
        &self,
        ctx: &CallContext,
        request: DeleteStoredCompletionRequest,
    ) -> Result<DeleteStoredCompletionResponse, Status>;
}

#[async_trait]
impl<S: ChatService + ?Sized> ChatService for Arc<S> {
    async fn get_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        (**self).get_completion(ctx, request).await
    }

    async fn get_completion_chunk(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<Box<dyn ChunkStream>, Status> {
        (**self).get_completion_chunk(ctx, request).await
    }

    async fn start_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<StartDeferredResponse, Status> {
        (**self).start_deferred_completion(ctx, request).await
    }

    async fn get_deferred_completion(
        &self,
        ctx: &CallContext,
        request: GetDeferredRequest,
    ) -> Result<GetDeferredCompletionResponse, Status> {
        (**self).get_deferred_completion(ctx, request).await
    }

    async fn get_stored_completion(
        &self,
        ctx: &CallContext,
        request: GetStoredCompletionRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        (**self).get_stored_completion(ctx, request).await
    }

    async fn delete_stored_completion(
        &self,
        ctx: &CallContext,
        request: DeleteStoredCompletionRequest,
    ) -> Result<DeleteStoredCompletionResponse, Status> {
        (**self).delete_stored_completion(ctx, request).await
    }
}
