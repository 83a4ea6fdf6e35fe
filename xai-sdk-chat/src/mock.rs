//! Scripted [`ChatService`] for tests.
//!
//! [`MockChatService`] replays queued replies in order and records every
//! request it sees, so session behaviour can be checked without a server.
//!
//! ```rust
//! use xai_sdk_chat::mock::MockChatService;
//! use xai_sdk_core::messages::GetChatCompletionResponse;
//!
//! let service = MockChatService::new()
//!     .with_completion(GetChatCompletionResponse::default())
//!     .with_stream_chunks(Vec::new());
//! assert!(service.recorded_requests().is_empty());
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use xai_sdk_core::messages::{
    DeleteStoredCompletionRequest, DeleteStoredCompletionResponse, GetChatCompletionChunk,
    GetChatCompletionResponse, GetCompletionsRequest, GetDeferredCompletionResponse,
    GetDeferredRequest, GetStoredCompletionRequest, StartDeferredResponse,
};
use xai_sdk_core::{CallContext, ChatService, ChunkStream, Status};

/// One scripted server stream.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStream {
    items: VecDeque<Result<GetChatCompletionChunk, Status>>,
    hang: bool,
}

impl ScriptedStream {
    /// A stream that yields `chunks` and then ends.
    pub fn chunks(chunks: impl IntoIterator<Item = GetChatCompletionChunk>) -> Self {
        Self {
            items: chunks.into_iter().map(Ok).collect(),
            hang: false,
        }
    }

    /// Fail with `status` after the scripted chunks.
    #[must_use]
    pub fn then_fail(mut self, status: Status) -> Self {
        self.items.push_back(Err(status));
        self
    }

    /// Never end after the scripted chunks.
    #[must_use]
    pub fn then_hang(mut self) -> Self {
        self.hang = true;
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    completions: VecDeque<Result<GetChatCompletionResponse, Status>>,
    streams: VecDeque<Result<ScriptedStream, Status>>,
    deferred: VecDeque<Result<GetDeferredCompletionResponse, Status>>,
    stored: VecDeque<GetChatCompletionResponse>,
    requests: Vec<GetCompletionsRequest>,
    deleted: Vec<String>,
    polls: usize,
    close_sends: usize,
}

/// A [`ChatService`] that replays scripted replies.
///
/// Clones share the same script and recordings.
#[derive(Debug, Clone, Default)]
pub struct MockChatService {
    state: Arc<Mutex<MockState>>,
}

impl MockChatService {
    /// Create a service with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a unary completion.
    #[must_use]
    pub fn with_completion(self, response: GetChatCompletionResponse) -> Self {
        self.state.lock().completions.push_back(Ok(response));
        self
    }

    /// Queue a failing unary completion.
    #[must_use]
    pub fn with_completion_error(self, status: Status) -> Self {
        self.state.lock().completions.push_back(Err(status));
        self
    }

    /// Queue a stream.
    #[must_use]
    pub fn with_stream(self, stream: ScriptedStream) -> Self {
        self.state.lock().streams.push_back(Ok(stream));
        self
    }

    /// Queue a stream that yields `chunks` and ends.
    #[must_use]
    pub fn with_stream_chunks(self, chunks: Vec<GetChatCompletionChunk>) -> Self {
        self.with_stream(ScriptedStream::chunks(chunks))
    }

    /// Queue a stream that fails to open.
    #[must_use]
    pub fn with_stream_open_error(self, status: Status) -> Self {
        self.state.lock().streams.push_back(Err(status));
        self
    }

    /// Queue one deferred poll result. Once the queue is drained polls
    /// report `PENDING`.
    #[must_use]
    pub fn with_deferred(self, response: GetDeferredCompletionResponse) -> Self {
        self.state.lock().deferred.push_back(Ok(response));
        self
    }

    /// Queue a failing deferred poll.
    #[must_use]
    pub fn with_deferred_error(self, status: Status) -> Self {
        self.state.lock().deferred.push_back(Err(status));
        self
    }

    /// Queue a stored completion.
    #[must_use]
    pub fn with_stored(self, response: GetChatCompletionResponse) -> Self {
        self.state.lock().stored.push_back(response);
        self
    }

    /// Every completion request received, in order.
    pub fn recorded_requests(&self) -> Vec<GetCompletionsRequest> {
        self.state.lock().requests.clone()
    }

    /// Response ids passed to `delete_stored_completion`.
    pub fn deleted_ids(&self) -> Vec<String> {
        self.state.lock().deleted.clone()
    }

    /// Number of deferred polls served.
    pub fn poll_count(&self) -> usize {
        self.state.lock().polls
    }

    /// Number of times any served stream was half-closed.
    pub fn close_send_count(&self) -> usize {
        self.state.lock().close_sends
    }
}

struct MockStream {
    script: ScriptedStream,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl ChunkStream for MockStream {
    async fn message(&mut self) -> Result<Option<GetChatCompletionChunk>, Status> {
        match self.script.items.pop_front() {
            Some(item) => item.map(Some),
            None if self.script.hang => std::future::pending().await,
            None => Ok(None),
        }
    }

    fn close_send(&mut self) {
        self.state.lock().close_sends += 1;
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn get_completion(
        &self,
        _ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        let mut state = self.state.lock();
        state.requests.push(request);
        state
            .completions
            .pop_front()
            .unwrap_or_else(|| Err(Status::unimplemented("no scripted completion")))
    }

    async fn get_completion_chunk(
        &self,
        _ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<Box<dyn ChunkStream>, Status> {
        let script = {
            let mut state = self.state.lock();
            state.requests.push(request);
            state
                .streams
                .pop_front()
                .unwrap_or_else(|| Err(Status::unimplemented("no scripted stream")))?
        };
        Ok(Box::new(MockStream {
            script,
            state: Arc::clone(&self.state),
        }))
    }

    async fn start_deferred_completion(
        &self,
        _ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<StartDeferredResponse, Status> {
        let mut state = self.state.lock();
        state.requests.push(request);
        Ok(StartDeferredResponse {
            request_id: format!("deferred-{}", state.requests.len()),
        })
    }

    async fn get_deferred_completion(
        &self,
        _ctx: &CallContext,
        _request: GetDeferredRequest,
    ) -> Result<GetDeferredCompletionResponse, Status> {
        let mut state = self.state.lock();
        state.polls += 1;
        state
            .deferred
            .pop_front()
            .unwrap_or_else(|| Ok(GetDeferredCompletionResponse::pending()))
    }

    async fn get_stored_completion(
        &self,
        _ctx: &CallContext,
        request: GetStoredCompletionRequest,
    ) -> Result<GetChatCompletionResponse, Status> {
        self.state.lock().stored.pop_front().ok_or_else(|| {
            Status::not_found(format!("no stored completion {}", request.response_id))
        })
    }

    async fn delete_stored_completion(
        &self,
        _ctx: &CallContext,
        request: DeleteStoredCompletionRequest,
    ) -> Result<DeleteStoredCompletionResponse, Status> {
        self.state.lock().deleted.push(request.response_id.clone());
        Ok(DeleteStoredCompletionResponse {
            response_id: request.response_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xai_sdk_core::Code;

    #[tokio::test]
    async fn test_stream_script_order() {
        let service = MockChatService::new().with_stream(
            ScriptedStream::chunks([GetChatCompletionChunk::default()])
                .then_fail(Status::internal("boom")),
        );
        let mut stream = service
            .get_completion_chunk(&CallContext::new(), GetCompletionsRequest::new("m"))
            .await
            .unwrap();

        assert!(stream.message().await.unwrap().is_some());
        assert_eq!(stream.message().await.unwrap_err().code(), Code::Internal);
        assert!(stream.message().await.unwrap().is_none());

        stream.close_send();
        assert_eq!(service.close_send_count(), 1);
    }

    #[tokio::test]
    async fn test_unscripted_completion_fails() {
        let service = MockChatService::new();
        let err = service
            .get_completion(&CallContext::new(), GetCompletionsRequest::new("m"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::Unimplemented);
        assert_eq!(service.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_deferred_defaults_to_pending() {
        let service = MockChatService::new();
        let poll = service
            .get_deferred_completion(
                &CallContext::new(),
                GetDeferredRequest {
                    request_id: "r".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(poll, GetDeferredCompletionResponse::pending());
        assert_eq!(service.poll_count(), 1);
    }
}
