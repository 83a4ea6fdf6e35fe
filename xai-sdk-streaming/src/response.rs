//! The aggregated chat response.
//!
//! [`Response`] folds streamed [`GetChatCompletionChunk`]s into a single
//! [`GetChatCompletionResponse`]. The first delta of a text field is written
//! straight into the canonical string; later deltas go to a pooled builder
//! that is swapped back into place on the next read. Observers cannot tell
//! the two paths apart.
//!
//! A `Response` is a cheap handle. Clones and [`Response::view`]s share the
//! same aggregate but each carries its own selected output index, which is
//! how a batch of N outputs is exposed as N responses.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

use xai_sdk_core::messages::{
    CompletionMessage, CompletionOutput, Content, FinishReason, GetChatCompletionChunk,
    GetChatCompletionResponse, Message, MessageRole, ToolCall, ToolCallType,
};
use xai_sdk_core::{Result, SamplingUsage};

use crate::pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TextField {
    Content,
    Reasoning,
    Encrypted,
}

impl TextField {
    fn slot(self, message: &mut CompletionMessage) -> &mut String {
        match self {
            Self::Content => &mut message.content,
            Self::Reasoning => &mut message.reasoning_content,
            Self::Encrypted => &mut message.encrypted_content,
        }
    }
}

/// Shared state behind every handle of one response.
#[derive(Debug, Default)]
struct Aggregate {
    proto: GetChatCompletionResponse,
    /// Deferred text per (output index, field). While a slot has a buffer,
    /// the canonical field for that slot is stale.
    buffers: BTreeMap<(i32, TextField), String>,
}

impl Aggregate {
    fn from_proto(mut proto: GetChatCompletionResponse) -> Self {
        proto.outputs.sort_by_key(|o| o.index);
        Self {
            proto,
            buffers: BTreeMap::new(),
        }
    }

    fn output_position(&mut self, index: i32) -> usize {
        match self.proto.outputs.binary_search_by_key(&index, |o| o.index) {
            Ok(pos) => pos,
            Err(pos) => {
                self.proto.outputs.insert(
                    pos,
                    CompletionOutput {
                        index,
                        ..CompletionOutput::default()
                    },
                );
                pos
            }
        }
    }

    fn process_chunk(&mut self, chunk: &GetChatCompletionChunk) {
        if !chunk.id.is_empty() {
            self.proto.id.clone_from(&chunk.id);
        }
        if !chunk.model.is_empty() {
            self.proto.model.clone_from(&chunk.model);
        }
        if !chunk.system_fingerprint.is_empty() {
            self.proto
                .system_fingerprint
                .clone_from(&chunk.system_fingerprint);
        }
        if chunk.created.is_some() {
            self.proto.created = chunk.created;
        }
        if chunk.usage.is_some() {
            self.proto.usage = chunk.usage;
        }
        self.proto.citations.extend(chunk.citations.iter().cloned());

        for output_chunk in &chunk.outputs {
            let pos = self.output_position(output_chunk.index);
            let delta = &output_chunk.delta;

            let output = &mut self.proto.outputs[pos];
            if delta.role != MessageRole::InvalidRole {
                output.message.role = delta.role;
            }
            if output_chunk.finish_reason.is_set() {
                output.finish_reason = output_chunk.finish_reason;
            }
            merge_tool_calls(&mut output.message.tool_calls, &delta.tool_calls);

            for (field, text) in [
                (TextField::Content, &delta.content),
                (TextField::Reasoning, &delta.reasoning_content),
                (TextField::Encrypted, &delta.encrypted_content),
            ] {
                if !text.is_empty() {
                    self.append_text(pos, field, text);
                }
            }
        }
    }

    fn append_text(&mut self, pos: usize, field: TextField, delta: &str) {
        let output = &mut self.proto.outputs[pos];
        let key = (output.index, field);

        if let Some(builder) = self.buffers.get_mut(&key) {
            builder.push_str(delta);
            return;
        }

        let canonical = field.slot(&mut output.message);
        if canonical.is_empty() {
            canonical.push_str(delta);
            return;
        }

        // First deferral for this slot: the canonical allocation moves into
        // the buffer and the pooled builder holds the slot until flush.
        let mut builder = pool::acquire(0);
        std::mem::swap(&mut builder, canonical);
        builder.reserve(delta.len());
        builder.push_str(delta);
        self.buffers.insert(key, builder);
    }

    fn flush(&mut self) {
        if self.buffers.is_empty() {
            return;
        }
        let buffers = std::mem::take(&mut self.buffers);
        trace!(buffers = buffers.len(), "flushing text buffers");

        for ((index, field), mut builder) in buffers {
            if let Ok(pos) = self.proto.outputs.binary_search_by_key(&index, |o| o.index) {
                std::mem::swap(field.slot(&mut self.proto.outputs[pos].message), &mut builder);
            }
            pool::release(builder);
        }
    }

    fn reset(&mut self) {
        for (_, builder) in std::mem::take(&mut self.buffers) {
            pool::release(builder);
        }
        self.proto = GetChatCompletionResponse::default();
    }
}

/// Merge streamed tool-call fragments into the accumulated calls.
///
/// A fragment continues an existing call when its `index` matches, or
/// failing that when its non-empty `id` matches. Otherwise it starts a new
/// call. Calls keep arrival order.
fn merge_tool_calls(calls: &mut Vec<ToolCall>, deltas: &[ToolCall]) {
    for delta in deltas {
        let by_index = delta
            .index
            .and_then(|index| calls.iter().position(|c| c.index == Some(index)));
        let existing = by_index.or_else(|| {
            if delta.id.is_empty() {
                None
            } else {
                calls.iter().position(|c| c.id == delta.id)
            }
        });

        let Some(pos) = existing else {
            calls.push(delta.clone());
            continue;
        };

        let call = &mut calls[pos];
        if call.id.is_empty() {
            call.id.clone_from(&delta.id);
        }
        if call.kind == ToolCallType::Invalid {
            call.kind = delta.kind;
        }
        if let Some(fragment) = &delta.function {
            let function = call.function.get_or_insert_with(Default::default);
            if function.name.is_empty() {
                function.name.clone_from(&fragment.name);
            }
            function.arguments.push_str(&fragment.arguments);
        }
    }
}

/// Outputs that count as the model's answer. An output whose role never
/// arrived is treated as assistant.
fn is_assistant(output: &CompletionOutput) -> bool {
    matches!(
        output.message.role,
        MessageRole::Assistant | MessageRole::InvalidRole
    )
}

fn selected(
    proto: &GetChatCompletionResponse,
    index: Option<i32>,
) -> impl Iterator<Item = &CompletionOutput> {
    proto
        .outputs
        .iter()
        .filter(move |o| is_assistant(o) && index.map_or(true, |i| o.index == i))
}

/// An aggregated chat response.
#[derive(Debug, Clone)]
pub struct Response {
    inner: Arc<Mutex<Aggregate>>,
    index: Option<i32>,
}

impl Response {
    /// Wrap a complete response, selecting `index` (or all outputs for `None`).
    pub fn new(proto: GetChatCompletionResponse, index: Option<i32>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Aggregate::from_proto(proto))),
            index,
        }
    }

    /// An empty response to be filled by [`Response::process_chunk`].
    pub fn streaming(index: Option<i32>) -> Self {
        Self::new(GetChatCompletionResponse::default(), index)
    }

    /// Expose a response with `n` outputs as `n` views pinned to indices `0..n`.
    pub fn split(proto: GetChatCompletionResponse, n: usize) -> Vec<Self> {
        let shared = Self::new(proto, None);
        (0..n)
            .map(|i| shared.view(i32::try_from(i).ok()))
            .collect()
    }

    /// Another handle on the same aggregate with its own selected index.
    pub fn view(&self, index: Option<i32>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            index,
        }
    }

    /// The selected output index; `None` means every output.
    pub fn index(&self) -> Option<i32> {
        self.index
    }

    /// Change the selected output index of this handle.
    pub fn set_index(&mut self, index: Option<i32>) {
        self.index = index;
    }

    /// Fold one streamed chunk into the aggregate.
    pub fn process_chunk(&self, chunk: &GetChatCompletionChunk) {
        self.inner.lock().process_chunk(chunk);
    }

    /// Switch to multi-output mode if `chunk` reports an output beyond the
    /// selected one. Returns `true` if the selection changed.
    pub fn auto_demote(&mut self, chunk: &GetChatCompletionChunk) -> bool {
        let Some(selected) = self.index else {
            return false;
        };
        if chunk.outputs.iter().any(|o| o.index > selected) {
            trace!(selected, "chunk reports additional outputs, selecting all");
            self.index = None;
            return true;
        }
        false
    }

    /// Switch to multi-output mode if the aggregate already holds an output
    /// beyond the selected one. Returns `true` if the selection changed.
    pub fn demote_if_multi_output(&mut self) -> bool {
        let Some(selected) = self.index else {
            return false;
        };
        let beyond = self
            .inner
            .lock()
            .proto
            .outputs
            .iter()
            .any(|o| o.index > selected);
        if beyond {
            self.index = None;
        }
        beyond
    }

    /// Clear the aggregate so it can be fed a fresh chunk sequence.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Write pending builders back into the canonical fields.
    pub fn flush(&self) {
        self.inner.lock().flush();
    }

    /// Whether every text field is in its canonical place.
    pub fn is_flushed(&self) -> bool {
        self.inner.lock().buffers.is_empty()
    }

    /// Run `f` against the flushed wire response.
    pub fn inspect<R>(&self, f: impl FnOnce(&GetChatCompletionResponse) -> R) -> R {
        let mut aggregate = self.inner.lock();
        aggregate.flush();
        f(&aggregate.proto)
    }

    fn collect_text(&self, field: fn(&CompletionMessage) -> &str) -> String {
        let index = self.index;
        self.inspect(|proto| selected(proto, index).map(|o| field(&o.message)).collect())
    }

    /// Visible content of the selected output(s), concatenated in index order.
    pub fn content(&self) -> String {
        self.collect_text(|m| m.content.as_str())
    }

    /// Reasoning trace of the selected output(s).
    pub fn reasoning_content(&self) -> String {
        self.collect_text(|m| m.reasoning_content.as_str())
    }

    /// Encrypted reasoning of the selected output(s).
    pub fn encrypted_content(&self) -> String {
        self.collect_text(|m| m.encrypted_content.as_str())
    }

    /// Role of the selected output, or of the last output in multi-output mode.
    pub fn role(&self) -> MessageRole {
        let index = self.index;
        self.inspect(|proto| {
            selected(proto, index)
                .last()
                .map(|o| o.message.role)
                .unwrap_or_default()
        })
    }

    /// Tool calls of the selected output(s).
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        let index = self.index;
        self.inspect(|proto| {
            selected(proto, index)
                .flat_map(|o| o.message.tool_calls.iter().cloned())
                .collect()
        })
    }

    /// Finish reason of the selected output, or of the last output in
    /// multi-output mode. Does not flush.
    pub fn finish_reason(&self) -> FinishReason {
        let aggregate = self.inner.lock();
        selected(&aggregate.proto, self.index)
            .last()
            .map(|o| o.finish_reason)
            .unwrap_or_default()
    }

    /// Finish reasons of every selected output, in index order.
    pub fn finish_reasons(&self) -> Vec<FinishReason> {
        let aggregate = self.inner.lock();
        selected(&aggregate.proto, self.index)
            .map(|o| o.finish_reason)
            .collect()
    }

    /// Whether the turn is over, i.e. a finish reason has been recorded.
    pub fn is_finished(&self) -> bool {
        self.finish_reason().is_set()
    }

    /// Token usage.
    pub fn usage(&self) -> Option<SamplingUsage> {
        self.inspect(|proto| proto.usage)
    }

    /// Citations, in arrival order.
    pub fn citations(&self) -> Vec<String> {
        self.inspect(|proto| proto.citations.clone())
    }

    /// Backend configuration fingerprint.
    pub fn system_fingerprint(&self) -> String {
        self.inspect(|proto| proto.system_fingerprint.clone())
    }

    /// Response identifier.
    pub fn id(&self) -> String {
        self.inspect(|proto| proto.id.clone())
    }

    /// Model that served the request.
    pub fn model(&self) -> String {
        self.inspect(|proto| proto.model.clone())
    }

    /// Creation time.
    pub fn created(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inspect(|proto| proto.created)
    }

    /// A copy of the flushed wire response.
    pub fn proto(&self) -> GetChatCompletionResponse {
        self.inspect(|proto| proto.clone())
    }

    /// Decode the content of the selected output(s) as JSON.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.content())?)
    }

    /// The selected output(s) as conversation messages, ready to append to
    /// a follow-up request.
    pub fn to_messages(&self) -> Vec<Message> {
        let index = self.index;
        self.inspect(|proto| selected(proto, index).map(output_to_message).collect())
    }
}

fn output_to_message(output: &CompletionOutput) -> Message {
    let message = &output.message;
    let role = match message.role {
        MessageRole::InvalidRole => MessageRole::Assistant,
        role => role,
    };
    let content = if message.content.is_empty() {
        Vec::new()
    } else {
        vec![Content::Text(message.content.clone())]
    };
    let tool_calls = message
        .tool_calls
        .iter()
        .cloned()
        .map(|mut call| {
            call.index = None;
            call
        })
        .collect();

    Message {
        content,
        reasoning_content: (!message.reasoning_content.is_empty())
            .then(|| message.reasoning_content.clone()),
        role,
        tool_calls,
        encrypted_content: message.encrypted_content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde::Deserialize;
    use xai_sdk_core::messages::{CompletionOutputChunk, Delta, FunctionCall};

    fn text_chunk(index: i32, content: &str) -> GetChatCompletionChunk {
        GetChatCompletionChunk {
            outputs: vec![CompletionOutputChunk {
                index,
                delta: Delta {
                    content: content.to_string(),
                    ..Delta::default()
                },
                ..CompletionOutputChunk::default()
            }],
            ..GetChatCompletionChunk::default()
        }
    }

    fn output(index: i32, content: &str) -> CompletionOutput {
        CompletionOutput {
            index,
            finish_reason: FinishReason::Stop,
            message: CompletionMessage {
                content: content.to_string(),
                role: MessageRole::Assistant,
                ..CompletionMessage::default()
            },
        }
    }

    #[test]
    fn test_single_chunk_unary() {
        let response = Response::new(
            GetChatCompletionResponse {
                id: "resp-1".into(),
                outputs: vec![CompletionOutput {
                    message: CompletionMessage {
                        content: "Hello".into(),
                        reasoning_content: "Why".into(),
                        role: MessageRole::Assistant,
                        ..CompletionMessage::default()
                    },
                    finish_reason: FinishReason::Stop,
                    index: 0,
                }],
                ..GetChatCompletionResponse::default()
            },
            Some(0),
        );

        assert_eq!(response.content(), "Hello");
        assert_eq!(response.reasoning_content(), "Why");
        assert_eq!(response.finish_reason(), FinishReason::Stop);
        assert_eq!(response.role(), MessageRole::Assistant);
        assert_eq!(response.id(), "resp-1");
    }

    #[test]
    fn test_two_chunk_streaming() {
        let response = Response::streaming(Some(0));

        let mut first = text_chunk(0, "Hel");
        first.outputs[0].delta.role = MessageRole::Assistant;
        response.process_chunk(&first);

        let mut second = text_chunk(0, "lo");
        second.outputs[0].finish_reason = FinishReason::Stop;
        second.usage = Some(SamplingUsage::new(3, 2));
        response.process_chunk(&second);

        assert!(!response.is_flushed());
        assert_eq!(response.content(), "Hello");
        assert!(response.is_flushed());
        assert_eq!(response.usage().map(|u| u.total_tokens), Some(5));
        assert_eq!(response.role(), MessageRole::Assistant);
        assert!(response.is_finished());
    }

    #[test]
    fn test_tool_call_streaming() {
        let response = Response::streaming(Some(0));

        let mut a = text_chunk(0, "Hel");
        a.outputs[0].delta.tool_calls = vec![ToolCall {
            index: Some(0),
            function: Some(FunctionCall {
                name: "lookup_city".into(),
                arguments: "{\"city\":\"Par".into(),
            }),
            ..ToolCall::default()
        }];
        let mut b = text_chunk(0, "lo");
        b.outputs[0].delta.tool_calls = vec![ToolCall {
            index: Some(0),
            id: "call-1".into(),
            function: Some(FunctionCall {
                name: String::new(),
                arguments: "is\"}".into(),
            }),
            ..ToolCall::default()
        }];
        let mut c = text_chunk(0, "");
        c.outputs[0].finish_reason = FinishReason::Stop;
        c.usage = Some(SamplingUsage::new(4, 2));

        for chunk in [&a, &b, &c] {
            response.process_chunk(chunk);
        }

        assert_eq!(response.content(), "Hello");
        let calls = response.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call-1");
        assert_eq!(calls[0].name(), "lookup_city");
        assert_eq!(
            calls[0].decode_arguments::<serde_json::Value>().unwrap(),
            serde_json::json!({"city": "Paris"})
        );
        assert_eq!(response.usage().map(|u| u.total_tokens), Some(6));
        assert_eq!(response.finish_reason(), FinishReason::Stop);
    }

    #[test]
    fn test_tool_calls_merge_by_id_and_keep_order() {
        let mut calls = Vec::new();
        merge_tool_calls(
            &mut calls,
            &[
                ToolCall::function("b", "second", "{"),
                ToolCall::function("a", "first", "{}"),
            ],
        );
        merge_tool_calls(&mut calls, &[ToolCall::function("b", "", "}")]);

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "b");
        assert_eq!(calls[0].arguments_json(), "{}");
        assert_eq!(calls[0].name(), "second");
        assert_eq!(calls[1].id, "a");
    }

    #[rstest]
    #[case::single(vec!["Hello"])]
    #[case::pair(vec!["Hel", "lo"])]
    #[case::many(vec!["a", "b", "c", "d", "e", "f"])]
    #[case::unicode(vec!["h\u{e9}", "\u{1f600}", "", "z"])]
    fn test_concatenation_law(#[case] deltas: Vec<&str>) {
        let response = Response::streaming(Some(0));
        for (i, delta) in deltas.iter().enumerate() {
            response.process_chunk(&text_chunk(0, delta));
            // Interleave reads so buffers are flushed mid-stream.
            if i % 2 == 1 {
                let _ = response.content();
            }
        }
        assert_eq!(response.content(), deltas.concat());
    }

    #[test]
    fn test_fields_accumulate_independently() {
        let response = Response::streaming(Some(0));
        for (content, reasoning, encrypted) in [("a", "x", "1"), ("b", "", "2"), ("", "y", "3")] {
            response.process_chunk(&GetChatCompletionChunk {
                outputs: vec![CompletionOutputChunk {
                    delta: Delta {
                        content: content.into(),
                        reasoning_content: reasoning.into(),
                        encrypted_content: encrypted.into(),
                        ..Delta::default()
                    },
                    ..CompletionOutputChunk::default()
                }],
                ..GetChatCompletionChunk::default()
            });
        }

        assert_eq!(response.content(), "ab");
        assert_eq!(response.reasoning_content(), "xy");
        assert_eq!(response.encrypted_content(), "123");
    }

    #[test]
    fn test_flush_is_idempotent() {
        let response = Response::streaming(Some(0));
        response.process_chunk(&text_chunk(0, "Hel"));
        response.process_chunk(&text_chunk(0, "lo"));

        let first = response.proto();
        let second = response.proto();
        assert_eq!(first, second);
        assert_eq!(response.content(), response.content());
    }

    #[test]
    fn test_reset_matches_fresh_aggregate() {
        let chunks = [text_chunk(0, "Hel"), text_chunk(0, "lo"), text_chunk(1, "!")];

        let reused = Response::streaming(None);
        reused.process_chunk(&text_chunk(0, "stale"));
        reused.process_chunk(&text_chunk(0, " data"));
        reused.reset();
        for chunk in &chunks {
            reused.process_chunk(chunk);
        }

        let fresh = Response::streaming(None);
        for chunk in &chunks {
            fresh.process_chunk(chunk);
        }

        assert_eq!(reused.proto(), fresh.proto());
        assert_eq!(reused.content(), "Hello!");
    }

    #[test]
    fn test_auto_demotion() {
        let mut response = Response::streaming(Some(0));
        let chunk = text_chunk(3, "three");

        assert!(response.auto_demote(&chunk));
        response.process_chunk(&chunk);
        assert_eq!(response.index(), None);

        response.process_chunk(&text_chunk(0, "zero"));
        assert_eq!(response.content(), "zerothree");
        assert!(!response.auto_demote(&text_chunk(5, "")));
    }

    #[test]
    fn test_no_demotion_for_selected_index() {
        let mut response = Response::streaming(Some(2));
        assert!(!response.auto_demote(&text_chunk(2, "x")));
        assert!(!response.auto_demote(&text_chunk(0, "x")));
        assert_eq!(response.index(), Some(2));
    }

    #[test]
    fn test_unary_multi_output_demotion() {
        let mut response = Response::new(
            GetChatCompletionResponse {
                outputs: vec![output(0, "a"), output(1, "b")],
                ..GetChatCompletionResponse::default()
            },
            Some(0),
        );
        assert!(response.demote_if_multi_output());
        assert_eq!(response.content(), "ab");
        assert!(!response.demote_if_multi_output());
    }

    #[test]
    fn test_batch_views() {
        let views = Response::split(
            GetChatCompletionResponse {
                outputs: vec![output(2, "c"), output(0, "a"), output(1, "b")],
                ..GetChatCompletionResponse::default()
            },
            3,
        );

        let contents: Vec<String> = views.iter().map(Response::content).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
        assert_eq!(views[1].index(), Some(1));
        assert_eq!(views[0].view(None).content(), "abc");
    }

    #[test]
    fn test_zero_outputs() {
        let response = Response::streaming(Some(0));
        response.process_chunk(&GetChatCompletionChunk {
            id: "resp-1".into(),
            ..GetChatCompletionChunk::default()
        });

        assert_eq!(response.content(), "");
        assert_eq!(response.reasoning_content(), "");
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.finish_reason(), FinishReason::Invalid);
        assert_eq!(response.role(), MessageRole::InvalidRole);
        assert_eq!(response.id(), "resp-1");
    }

    #[test]
    fn test_metadata_last_write_wins_and_citations_append() {
        let response = Response::streaming(Some(0));
        response.process_chunk(&GetChatCompletionChunk {
            id: "a".into(),
            model: "grok-3".into(),
            citations: vec!["https://x.ai".into()],
            ..GetChatCompletionChunk::default()
        });
        response.process_chunk(&GetChatCompletionChunk {
            id: "b".into(),
            model: "grok-4".into(),
            system_fingerprint: "fp".into(),
            citations: vec!["https://x.ai".into(), "https://docs.x.ai".into()],
            ..GetChatCompletionChunk::default()
        });

        assert_eq!(response.id(), "b");
        assert_eq!(response.model(), "grok-4");
        assert_eq!(response.system_fingerprint(), "fp");
        assert_eq!(
            response.citations(),
            vec!["https://x.ai", "https://x.ai", "https://docs.x.ai"]
        );
    }

    #[test]
    fn test_created_kept_when_later_chunks_omit_it() {
        let created = chrono::DateTime::from_timestamp(1_700_000_000, 0);
        let response = Response::streaming(Some(0));
        assert_eq!(response.created(), None);

        response.process_chunk(&GetChatCompletionChunk {
            created,
            ..GetChatCompletionChunk::default()
        });
        response.process_chunk(&text_chunk(0, "tail"));

        assert_eq!(response.created(), created);
        assert_eq!(
            response.created().map(|at| at.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_non_assistant_outputs_ignored() {
        let mut proto = GetChatCompletionResponse {
            outputs: vec![output(0, "answer"), output(1, "echo")],
            ..GetChatCompletionResponse::default()
        };
        proto.outputs[1].message.role = MessageRole::User;

        let response = Response::new(proto, None);
        assert_eq!(response.content(), "answer");
    }

    #[test]
    fn test_decode_json() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct City {
            name: String,
        }

        let response = Response::streaming(Some(0));
        response.process_chunk(&text_chunk(0, "{\"name\":"));
        response.process_chunk(&text_chunk(0, "\"Paris\"}"));
        assert_eq!(
            response.decode_json::<City>().unwrap(),
            City {
                name: "Paris".into()
            }
        );

        let broken = Response::streaming(Some(0));
        broken.process_chunk(&text_chunk(0, "{"));
        assert!(matches!(
            broken.decode_json::<City>(),
            Err(xai_sdk_core::XaiError::Json(_))
        ));
    }

    #[test]
    fn test_to_messages() {
        let response = Response::streaming(Some(0));
        let mut chunk = text_chunk(0, "Hi");
        chunk.outputs[0].delta.reasoning_content = "because".into();
        chunk.outputs[0].delta.tool_calls = vec![ToolCall {
            index: Some(0),
            ..ToolCall::function("call-1", "f", "{}")
        }];
        response.process_chunk(&chunk);

        let messages = response.to_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::Assistant);
        assert_eq!(messages[0].text(), "Hi");
        assert_eq!(messages[0].reasoning_content.as_deref(), Some("because"));
        assert_eq!(messages[0].tool_calls[0].index, None);
        assert!(messages[0].validate().is_ok());
    }
}
