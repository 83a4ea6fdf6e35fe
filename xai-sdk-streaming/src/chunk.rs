//! A view over a single streamed chunk.

use xai_sdk_core::messages::{CompletionOutputChunk, GetChatCompletionChunk, MessageRole, ToolCall};
use xai_sdk_core::{FinishReason, SamplingUsage};

/// The last chunk received on a stream, filtered to the selected output(s).
///
/// Unlike [`crate::Response`], a `Chunk` holds only the deltas of one
/// server message.
#[derive(Debug, Clone)]
pub struct Chunk {
    proto: GetChatCompletionChunk,
    index: Option<i32>,
}

impl Chunk {
    /// Wrap a chunk, selecting `index` (or every output for `None`).
    pub fn new(proto: GetChatCompletionChunk, index: Option<i32>) -> Self {
        Self { proto, index }
    }

    fn outputs(&self) -> impl Iterator<Item = &CompletionOutputChunk> {
        let index = self.index;
        self.proto.outputs.iter().filter(move |o| {
            matches!(
                o.delta.role,
                MessageRole::Assistant | MessageRole::InvalidRole
            ) && index.map_or(true, |i| o.index == i)
        })
    }

    /// Content delta.
    pub fn content(&self) -> String {
        self.outputs().map(|o| o.delta.content.as_str()).collect()
    }

    /// Reasoning delta.
    pub fn reasoning_content(&self) -> String {
        self.outputs()
            .map(|o| o.delta.reasoning_content.as_str())
            .collect()
    }

    /// Tool-call fragments.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.outputs()
            .flat_map(|o| o.delta.tool_calls.iter().cloned())
            .collect()
    }

    /// Finish reason carried by this chunk, if any.
    pub fn finish_reason(&self) -> FinishReason {
        self.outputs()
            .map(|o| o.finish_reason)
            .filter(|r| r.is_set())
            .last()
            .unwrap_or_default()
    }

    /// Usage totals carried by this chunk.
    pub fn usage(&self) -> Option<SamplingUsage> {
        self.proto.usage
    }

    /// The selected output index.
    pub fn index(&self) -> Option<i32> {
        self.index
    }

    /// The raw chunk.
    pub fn proto(&self) -> &GetChatCompletionChunk {
        &self.proto
    }
}
