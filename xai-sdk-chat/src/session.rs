//! Chat sessions.
//!
//! A [`ChatSession`] owns a request template (model, sampling knobs and the
//! conversation so far). Every RPC works on a deep clone of the template, so
//! batch sizes and structured-output formats installed for one call never
//! leak into the next.

use opentelemetry::global::BoxedSpan;
use opentelemetry::trace::{Span, Status as SpanStatus};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use xai_sdk_core::messages::{
    tool_result, GetChatCompletionResponse, GetCompletionsRequest, Message, ResponseFormat,
};
use xai_sdk_core::{CallContext, ChatService, Result, XaiError};
use xai_sdk_output::response_format_for;
use xai_sdk_streaming::Response;

use crate::deferred::{run_deferred, DeferredOptions};
use crate::error::ParseError;
use crate::options::{ChatOption, SessionMetadata};
use crate::stream::ChatStream;
use crate::telemetry;

/// A conversation with one model.
///
/// Mutating methods (`append*`) take `&mut self`; RPC methods take `&self`
/// and can run one after another without re-applying options.
#[derive(Clone)]
pub struct ChatSession {
    service: Arc<dyn ChatService>,
    request: GetCompletionsRequest,
    metadata: SessionMetadata,
}

impl ChatSession {
    /// Create a session for `model`, applying `options` in order.
    pub fn new(
        service: Arc<dyn ChatService>,
        model: impl Into<String>,
        options: impl IntoIterator<Item = ChatOption>,
    ) -> Self {
        let mut request = GetCompletionsRequest::new(model);
        let mut metadata = SessionMetadata::default();
        for option in options {
            option.apply(&mut request, &mut metadata);
        }
        Self {
            service,
            request,
            metadata,
        }
    }

    /// Apply one more option to the template.
    pub fn apply(&mut self, option: ChatOption) -> &mut Self {
        option.apply(&mut self.request, &mut self.metadata);
        self
    }

    /// Append a message to the conversation.
    pub fn append(&mut self, message: Message) -> &mut Self {
        self.request.messages.push(message);
        self
    }

    /// Append the selected output(s) of `response` as assistant turns.
    ///
    /// A response in multi-output mode appends every output in index order.
    pub fn append_response(&mut self, response: &Response) -> &mut Self {
        self.request.messages.extend(response.to_messages());
        self
    }

    /// Append a tool result whose payload is already a string.
    ///
    /// The wire message has no tool-call id, so `tool_call_id` only shows up
    /// in logs.
    pub fn append_tool_result(
        &mut self,
        tool_call_id: &str,
        payload: impl Into<String>,
    ) -> &mut Self {
        trace!(tool_call_id, "appending tool result");
        self.append(tool_result(payload))
    }

    /// Append a tool result, serialising `result` as JSON.
    pub fn append_tool_result_json<T: Serialize + ?Sized>(
        &mut self,
        tool_call_id: &str,
        result: &T,
    ) -> Result<&mut Self> {
        let payload = serde_json::to_string(result)?;
        Ok(self.append_tool_result(tool_call_id, payload))
    }

    /// The conversation so far.
    pub fn messages(&self) -> &[Message] {
        &self.request.messages
    }

    /// The request template.
    pub fn request(&self) -> &GetCompletionsRequest {
        &self.request
    }

    /// Client-side conversation id, reported in telemetry only.
    pub fn conversation_id(&self) -> Option<&str> {
        self.metadata.conversation_id.as_deref()
    }

    /// Sample one response.
    pub async fn sample(&self, ctx: &CallContext) -> Result<Response> {
        let (request, mut span) = self.begin("sample", 1);
        let result = self.complete(ctx, request).await;
        end_span(&mut span, result.as_ref().map(std::slice::from_ref));
        result
    }

    /// Sample `n >= 2` responses in one call.
    ///
    /// Every returned handle shares one aggregate and selects its own output.
    pub async fn sample_batch(&self, ctx: &CallContext, n: usize) -> Result<Vec<Response>> {
        let n_wire = batch_size(n)?;
        let (request, mut span) = self.begin("sample_batch", n_wire);
        let result = self
            .complete(ctx, request)
            .await
            .map(|response| split(response, n));
        end_span(&mut span, result.as_deref());
        result
    }

    /// Stream one response.
    pub async fn stream(&self, ctx: &CallContext) -> Result<ChatStream> {
        self.open_stream(ctx, "stream", 1).await
    }

    /// Stream `n >= 2` responses in one call. The aggregate holds every output.
    pub async fn stream_batch(&self, ctx: &CallContext, n: usize) -> Result<ChatStream> {
        let n_wire = batch_size(n)?;
        self.open_stream(ctx, "stream_batch", n_wire).await
    }

    /// Run as a deferred completion and poll until it is done.
    pub async fn defer(&self, ctx: &CallContext, options: DeferredOptions) -> Result<Response> {
        let (request, mut span) = self.begin("defer", 1);
        let result = self.deferred(ctx, request, options).await;
        end_span(&mut span, result.as_ref().map(std::slice::from_ref));
        result
    }

    /// Run as a deferred completion with `n >= 2` outputs.
    pub async fn defer_batch(
        &self,
        ctx: &CallContext,
        n: usize,
        options: DeferredOptions,
    ) -> Result<Vec<Response>> {
        let n_wire = batch_size(n)?;
        let (request, mut span) = self.begin("defer_batch", n_wire);
        let result = self
            .deferred(ctx, request, options)
            .await
            .map(|response| split(response, n));
        end_span(&mut span, result.as_deref());
        result
    }

    /// Sample one response constrained to the JSON schema of `T` and decode it.
    ///
    /// A JSON-schema response format already on the template is kept.
    /// If decoding fails the received response is still available through
    /// [`ParseError::response`].
    pub async fn parse<T>(&self, ctx: &CallContext) -> std::result::Result<(Response, T), ParseError>
    where
        T: JsonSchema + DeserializeOwned + 'static,
    {
        let mut request = self.prepare(1);
        let has_schema = request
            .response_format
            .as_ref()
            .is_some_and(ResponseFormat::is_json_schema);
        if !has_schema {
            request.response_format = Some(response_format_for::<T>()?);
        }

        let mut span = self.start_span("parse", &request);
        let response = match self.complete(ctx, request).await {
            Ok(response) => response,
            Err(err) => {
                end_span(&mut span, Err(&err));
                return Err(err.into());
            }
        };
        span.set_attributes(telemetry::response_attributes(std::slice::from_ref(
            &response,
        )));

        match serde_json::from_str::<T>(&response.content()) {
            Ok(value) => {
                span.set_status(SpanStatus::Ok);
                span.end();
                Ok((response, value))
            }
            Err(source) => {
                debug!(error = %source, "structured response did not decode");
                telemetry::fail_span(&mut span, &source);
                span.end();
                Err(ParseError::Decode { source, response })
            }
        }
    }

    /// Like [`ChatSession::parse`], returning only the decoded value.
    pub async fn parse_into<T>(&self, ctx: &CallContext) -> std::result::Result<T, ParseError>
    where
        T: JsonSchema + DeserializeOwned + 'static,
    {
        self.parse::<T>(ctx).await.map(|(_, value)| value)
    }

    /// Clone the template and install the batch size.
    fn prepare(&self, n: i32) -> GetCompletionsRequest {
        let mut request = self.request.clone();
        request.n = Some(n);
        request
    }

    fn start_span(&self, operation: &str, request: &GetCompletionsRequest) -> BoxedSpan {
        telemetry::start_span(
            operation,
            &request.model,
            telemetry::request_attributes(request, &self.metadata),
        )
    }

    fn begin(&self, operation: &str, n: i32) -> (GetCompletionsRequest, BoxedSpan) {
        let request = self.prepare(n);
        let span = self.start_span(operation, &request);
        debug!(operation, model = %request.model, n, "chat call");
        (request, span)
    }

    async fn complete(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
    ) -> Result<Response> {
        request.validate()?;
        let server_side_tools = request.uses_server_side_tools();
        let proto = self.service.get_completion(ctx, request).await?;
        Ok(single(proto, server_side_tools))
    }

    async fn deferred(
        &self,
        ctx: &CallContext,
        request: GetCompletionsRequest,
        options: DeferredOptions,
    ) -> Result<Response> {
        request.validate()?;
        let server_side_tools = request.uses_server_side_tools();
        let proto = run_deferred(self.service.as_ref(), ctx, request, options).await?;
        Ok(single(proto, server_side_tools))
    }

    async fn open_stream(
        &self,
        ctx: &CallContext,
        operation: &str,
        n: i32,
    ) -> Result<ChatStream> {
        let (request, mut span) = self.begin(operation, n);
        let index = (n == 1 && !request.uses_server_side_tools()).then_some(0);

        let opened = match request.validate() {
            Ok(()) => self
                .service
                .get_completion_chunk(ctx, request)
                .await
                .map_err(XaiError::from),
            Err(err) => Err(err),
        };

        match opened {
            Ok(stream) => Ok(ChatStream::new(
                stream,
                Response::streaming(index),
                Some(span),
                ctx.clone(),
            )),
            Err(err) => {
                end_span(&mut span, Err(&err));
                Err(err)
            }
        }
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("model", &self.request.model)
            .field("messages", &self.request.messages.len())
            .field("conversation_id", &self.metadata.conversation_id)
            .finish_non_exhaustive()
    }
}

/// Batch calls request at least two outputs; use the single-output call for one.
fn batch_size(n: usize) -> Result<i32> {
    match i32::try_from(n) {
        Ok(n) if n >= 2 => Ok(n),
        _ => Err(XaiError::validation(format!(
            "batch size must be between 2 and {}, got {n}",
            i32::MAX
        ))),
    }
}

/// Wrap a unary reply for a single-output call. Server-side tools, or a
/// reply carrying more outputs than requested, select every output.
fn single(proto: GetChatCompletionResponse, server_side_tools: bool) -> Response {
    let index = (!server_side_tools).then_some(0);
    let mut response = Response::new(proto, index);
    response.demote_if_multi_output();
    response
}

fn split(response: Response, n: usize) -> Vec<Response> {
    (0..n)
        .map(|i| response.view(i32::try_from(i).ok()))
        .collect()
}

fn end_span(span: &mut BoxedSpan, outcome: std::result::Result<&[Response], &XaiError>) {
    match outcome {
        Ok(responses) => telemetry::succeed_span(span, responses),
        Err(err) => telemetry::fail_span(span, err),
    }
    span.end();
}
