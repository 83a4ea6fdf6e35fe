//! The completion request.

use serde::{Deserialize, Serialize};

use super::content::Message;
use super::search::SearchParameters;
use super::tools::{Tool, ToolChoice};
use crate::errors::{Result, XaiError};

wire_enum! {
    /// Shape of the model output.
    pub enum FormatType {
        /// Unset.
        #[default]
        Invalid = 0 => "FORMAT_TYPE_INVALID",
        /// Free text.
        Text = 1 => "FORMAT_TYPE_TEXT",
        /// Any JSON object.
        JsonObject = 2 => "FORMAT_TYPE_JSON_OBJECT",
        /// JSON conforming to a schema.
        JsonSchema = 3 => "FORMAT_TYPE_JSON_SCHEMA",
    }
}

wire_enum! {
    /// How hard a reasoning model should think.
    pub enum ReasoningEffort {
        /// Unset.
        #[default]
        Invalid = 0 => "INVALID_EFFORT",
        /// Low effort.
        Low = 1 => "EFFORT_LOW",
        /// Medium effort.
        Medium = 2 => "EFFORT_MEDIUM",
        /// High effort.
        High = 3 => "EFFORT_HIGH",
    }
}

/// Requested response format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// Output shape.
    pub format_type: FormatType,
    /// JSON schema string, set when `format_type` is [`FormatType::JsonSchema`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl ResponseFormat {
    /// Plain text output.
    pub fn text() -> Self {
        Self {
            format_type: FormatType::Text,
            schema: None,
        }
    }

    /// Any JSON object.
    pub fn json_object() -> Self {
        Self {
            format_type: FormatType::JsonObject,
            schema: None,
        }
    }

    /// JSON conforming to `schema`.
    pub fn json_schema(schema: impl Into<String>) -> Self {
        Self {
            format_type: FormatType::JsonSchema,
            schema: Some(schema.into()),
        }
    }

    /// Whether this requests schema-constrained JSON.
    pub fn is_json_schema(&self) -> bool {
        self.format_type == FormatType::JsonSchema
    }
}

/// A chat completion request.
///
/// Sessions keep one of these as a template and clone it for every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetCompletionsRequest {
    /// Conversation so far.
    pub messages: Vec<Message>,
    /// Model name.
    pub model: String,
    /// End-user identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    /// Number of outputs to sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<i32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,
    /// Sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Return log probabilities.
    pub logprobs: bool,
    /// Number of top log probabilities per token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<i32>,
    /// Tools the model may call.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Tool selection strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Output format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    /// Reasoning effort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Live search configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_parameters: Option<SearchParameters>,
    /// Allow several tool calls in one turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    /// Continue from a stored response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    /// Store the conversation server-side.
    pub store_messages: bool,
    /// Return encrypted reasoning content.
    pub use_encrypted_content: bool,
}

impl GetCompletionsRequest {
    /// Create an empty request for `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Whether any tool runs on the server.
    ///
    /// Server-side tools may produce more than one output, so callers treat
    /// such requests as multi-output.
    pub fn uses_server_side_tools(&self) -> bool {
        self.tools.iter().any(Tool::is_server_side)
    }

    /// Check the request can be sent.
    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(XaiError::validation(
                "chat request requires at least one message",
            ));
        }
        self.messages.iter().try_for_each(Message::validate)
    }
}
