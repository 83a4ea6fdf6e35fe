//! Chat session options.
//!
//! Options are applied in order when a session is created. Each one mutates
//! the request template, the session metadata, or both. Optional knobs are
//! only installed when an option supplies them, so an unset temperature stays
//! unset on the wire rather than becoming zero.

use std::any::type_name;
use std::sync::Arc;
use tracing::warn;

use xai_sdk_core::messages::{
    GetCompletionsRequest, Message, ReasoningEffort, ResponseFormat, SearchParameters, Tool,
    ToolChoice,
};
use xai_sdk_output::{json_schema_for, JsonSchema};

/// Client-side state of a session that never goes on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetadata {
    /// Caller-supplied conversation identifier, reported in telemetry only.
    pub conversation_id: Option<String>,
}

/// A customization applied when a chat session is created.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ChatOption {
    /// Append messages.
    Messages(Vec<Message>),
    /// End-user identifier.
    User(String),
    /// Maximum tokens to generate.
    MaxTokens(i32),
    /// Sampling seed.
    Seed(i32),
    /// Append stop sequences.
    Stop(Vec<String>),
    /// Sampling temperature.
    Temperature(f32),
    /// Nucleus sampling probability.
    TopP(f32),
    /// Return log probabilities.
    Logprobs(bool),
    /// Number of top log probabilities.
    TopLogprobs(i32),
    /// Append tools.
    Tools(Vec<Tool>),
    /// Replace the tool choice.
    ToolChoice(ToolChoice),
    /// Allow parallel tool calls.
    ParallelToolCalls(bool),
    /// Replace the response format.
    ResponseFormat(ResponseFormat),
    /// Schema-mode response format from a derived schema. `schema` is `None`
    /// when derivation failed, in which case the option does nothing.
    JsonStruct {
        /// Name of the Rust type the schema was derived from.
        type_name: &'static str,
        /// The derived schema.
        schema: Option<Arc<str>>,
    },
    /// Frequency penalty.
    FrequencyPenalty(f32),
    /// Presence penalty.
    PresencePenalty(f32),
    /// Reasoning effort.
    ReasoningEffort(ReasoningEffort),
    /// Live search configuration.
    SearchParameters(SearchParameters),
    /// Store messages server-side.
    StoreMessages(bool),
    /// Continue from a stored response.
    PreviousResponse(String),
    /// Return encrypted reasoning content.
    EncryptedContent(bool),
    /// Client-side conversation identifier.
    ConversationId(String),
}

impl ChatOption {
    /// Apply this option.
    pub fn apply(self, request: &mut GetCompletionsRequest, session: &mut SessionMetadata) {
        match self {
            Self::Messages(messages) => request.messages.extend(messages),
            Self::User(user) => request.user = user,
            Self::MaxTokens(v) => request.max_tokens = Some(v),
            Self::Seed(v) => request.seed = Some(v),
            Self::Stop(stop) => request.stop.extend(stop),
            Self::Temperature(v) => request.temperature = Some(v),
            Self::TopP(v) => request.top_p = Some(v),
            Self::Logprobs(v) => request.logprobs = v,
            Self::TopLogprobs(v) => request.top_logprobs = Some(v),
            Self::Tools(tools) => request.tools.extend(tools),
            Self::ToolChoice(choice) => request.tool_choice = Some(choice),
            Self::ParallelToolCalls(v) => request.parallel_tool_calls = Some(v),
            Self::ResponseFormat(format) => request.response_format = Some(format),
            Self::JsonStruct { type_name, schema } => match schema {
                Some(schema) => {
                    request.response_format = Some(ResponseFormat::json_schema(schema.as_ref()));
                }
                None => warn!(type_name, "JSON schema unavailable, response format unchanged"),
            },
            Self::FrequencyPenalty(v) => request.frequency_penalty = Some(v),
            Self::PresencePenalty(v) => request.presence_penalty = Some(v),
            Self::ReasoningEffort(v) => request.reasoning_effort = Some(v),
            Self::SearchParameters(params) => request.search_parameters = Some(params),
            Self::StoreMessages(v) => request.store_messages = v,
            Self::PreviousResponse(id) => request.previous_response_id = Some(id),
            Self::EncryptedContent(v) => request.use_encrypted_content = v,
            Self::ConversationId(id) => session.conversation_id = Some(id),
        }
    }
}

/// Append initial messages.
pub fn with_messages(messages: impl IntoIterator<Item = Message>) -> ChatOption {
    ChatOption::Messages(messages.into_iter().collect())
}

/// Set the end-user identifier.
pub fn with_user(user: impl Into<String>) -> ChatOption {
    ChatOption::User(user.into())
}

/// Set the maximum number of tokens to generate.
pub fn with_max_tokens(max_tokens: i32) -> ChatOption {
    ChatOption::MaxTokens(max_tokens)
}

/// Set the sampling seed.
pub fn with_seed(seed: i32) -> ChatOption {
    ChatOption::Seed(seed)
}

/// Append stop sequences.
pub fn with_stop<I, S>(stop: I) -> ChatOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ChatOption::Stop(stop.into_iter().map(Into::into).collect())
}

/// Set the sampling temperature.
pub fn with_temperature(temperature: f32) -> ChatOption {
    ChatOption::Temperature(temperature)
}

/// Set the nucleus sampling probability.
pub fn with_top_p(top_p: f32) -> ChatOption {
    ChatOption::TopP(top_p)
}

/// Enable log probabilities.
pub fn with_logprobs(enabled: bool) -> ChatOption {
    ChatOption::Logprobs(enabled)
}

/// Set the number of top log probabilities.
pub fn with_top_logprobs(n: i32) -> ChatOption {
    ChatOption::TopLogprobs(n)
}

/// Append tools.
pub fn with_tools(tools: impl IntoIterator<Item = Tool>) -> ChatOption {
    ChatOption::Tools(tools.into_iter().collect())
}

/// Replace the tool choice.
pub fn with_tool_choice(choice: ToolChoice) -> ChatOption {
    ChatOption::ToolChoice(choice)
}

/// Allow or forbid parallel tool calls.
pub fn with_parallel_tool_calls(enabled: bool) -> ChatOption {
    ChatOption::ParallelToolCalls(enabled)
}

/// Replace the response format.
pub fn with_response_format(format: ResponseFormat) -> ChatOption {
    ChatOption::ResponseFormat(format)
}

/// Constrain output to a JSON schema given as a string.
pub fn with_json_schema(schema: impl Into<String>) -> ChatOption {
    ChatOption::ResponseFormat(ResponseFormat::json_schema(schema))
}

/// Constrain output to the JSON schema of `T`.
///
/// The schema is derived once per type and cached. If derivation fails the
/// option leaves the request untouched and logs a warning.
pub fn with_json_struct<T: JsonSchema + 'static>() -> ChatOption {
    let schema = match json_schema_for::<T>() {
        Ok(schema) => Some(schema),
        Err(e) => {
            warn!(type_name = type_name::<T>(), error = %e, "JSON schema derivation failed");
            None
        }
    };
    ChatOption::JsonStruct {
        type_name: type_name::<T>(),
        schema,
    }
}

/// Set the frequency penalty.
pub fn with_frequency_penalty(penalty: f32) -> ChatOption {
    ChatOption::FrequencyPenalty(penalty)
}

/// Set the presence penalty.
pub fn with_presence_penalty(penalty: f32) -> ChatOption {
    ChatOption::PresencePenalty(penalty)
}

/// Set the reasoning effort.
pub fn with_reasoning_effort(effort: ReasoningEffort) -> ChatOption {
    ChatOption::ReasoningEffort(effort)
}

/// Install live search parameters.
pub fn with_search_parameters(params: SearchParameters) -> ChatOption {
    ChatOption::SearchParameters(params)
}

/// Install live search parameters. Alias of [`with_search_parameters`].
pub fn with_search(params: SearchParameters) -> ChatOption {
    with_search_parameters(params)
}

/// Store messages server-side.
pub fn with_store_messages(store: bool) -> ChatOption {
    ChatOption::StoreMessages(store)
}

/// Continue from a stored response.
pub fn with_previous_response(response_id: impl Into<String>) -> ChatOption {
    ChatOption::PreviousResponse(response_id.into())
}

/// Return encrypted reasoning content.
pub fn with_encrypted_content(enabled: bool) -> ChatOption {
    ChatOption::EncryptedContent(enabled)
}

/// Tag the session with a conversation identifier. Client-side only.
pub fn with_conversation_id(id: impl Into<String>) -> ChatOption {
    ChatOption::ConversationId(id.into())
}
