//! Completion responses and streamed chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::MessageRole;
use super::tools::ToolCall;
use crate::usage::SamplingUsage;

wire_enum! {
    /// Why an output stopped.
    pub enum FinishReason {
        /// Not finished, or unset.
        #[default]
        Invalid = 0 => "REASON_INVALID",
        /// Hit `max_tokens`.
        MaxLen = 1 => "REASON_MAX_LEN",
        /// Hit the context window.
        MaxContext = 2 => "REASON_MAX_CONTEXT",
        /// Natural stop or stop sequence.
        Stop = 3 => "REASON_STOP",
        /// Stopped to let the client run tools.
        ToolCalls = 4 => "REASON_TOOL_CALLS",
        /// Hit the server time limit.
        TimeLimit = 5 => "REASON_TIME_LIMIT",
    }
}

impl FinishReason {
    /// Whether a reason has been recorded.
    pub fn is_set(self) -> bool {
        self != Self::Invalid
    }
}

/// The message of one completion output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionMessage {
    /// Visible content.
    pub content: String,
    /// Reasoning trace.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reasoning_content: String,
    /// Author, normally assistant.
    pub role: MessageRole,
    /// Tool calls.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Encrypted reasoning.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encrypted_content: String,
}

/// One of the N outputs of a completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionOutput {
    /// Why the output stopped.
    pub finish_reason: FinishReason,
    /// Output index, unique within a response.
    pub index: i32,
    /// The generated message.
    pub message: CompletionMessage,
}

/// A complete chat response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetChatCompletionResponse {
    /// Response identifier.
    pub id: String,
    /// Outputs, sorted by index.
    pub outputs: Vec<CompletionOutput>,
    /// Creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Model that served the request.
    pub model: String,
    /// Backend configuration fingerprint.
    pub system_fingerprint: String,
    /// Token usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<SamplingUsage>,
    /// Citations from server-side search.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
}

impl GetChatCompletionResponse {
    /// The output with `index`, if present.
    pub fn output(&self, index: i32) -> Option<&CompletionOutput> {
        self.outputs.iter().find(|o| o.index == index)
    }
}

/// A partial update to one output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delta {
    /// Content suffix.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    /// Reasoning suffix.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reasoning_content: String,
    /// Role tag, usually only on the first delta.
    pub role: MessageRole,
    /// Tool-call fragments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Encrypted-content suffix.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encrypted_content: String,
}

/// One output's share of a streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionOutputChunk {
    /// The delta.
    pub delta: Delta,
    /// Output index.
    pub index: i32,
    /// Set on the chunk that finishes this output.
    pub finish_reason: FinishReason,
}

/// A server-sent increment of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetChatCompletionChunk {
    /// Response identifier, repeated on every chunk.
    pub id: String,
    /// Per-output deltas.
    pub outputs: Vec<CompletionOutputChunk>,
    /// Creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Model that served the request.
    pub model: String,
    /// Backend configuration fingerprint.
    pub system_fingerprint: String,
    /// Running usage totals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<SamplingUsage>,
    /// New citations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
}
