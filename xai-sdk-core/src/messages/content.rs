//! Conversation messages and their content parts.

use serde::{Deserialize, Serialize};

use super::tools::ToolCall;
use crate::errors::{Result, XaiError};

wire_enum! {
    /// Author of a message.
    pub enum MessageRole {
        /// Unset.
        #[default]
        InvalidRole = 0 => "INVALID_ROLE",
        /// End user.
        User = 1 => "ROLE_USER",
        /// Model output.
        Assistant = 2 => "ROLE_ASSISTANT",
        /// System instructions.
        System = 3 => "ROLE_SYSTEM",
        /// Result of a client-side tool call.
        Tool = 4 => "ROLE_TOOL",
    }
}

wire_enum! {
    /// Resolution hint for image inputs.
    pub enum ImageDetail {
        /// Unset.
        #[default]
        Invalid = 0 => "DETAIL_INVALID",
        /// Let the server decide.
        Auto = 1 => "DETAIL_AUTO",
        /// Low resolution.
        Low = 2 => "DETAIL_LOW",
        /// High resolution.
        High = 3 => "DETAIL_HIGH",
    }
}

/// An image referenced by URL or data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrlContent {
    /// `https://` URL or base64 `data:` URI.
    pub image_url: String,
    /// Resolution hint.
    #[serde(default)]
    pub detail: ImageDetail,
}

/// A previously uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// File identifier returned by the files API.
    pub file_id: String,
}

/// One part of a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    /// Plain text.
    Text(String),
    /// An image.
    ImageUrl(ImageUrlContent),
    /// An uploaded file.
    File(FileContent),
}

impl Content {
    /// The text of a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Wrap plain text into a content part.
pub fn text_content(text: impl Into<String>) -> Content {
    Content::Text(text.into())
}

/// Reference an image with a resolution hint.
pub fn image_content(url: impl Into<String>, detail: ImageDetail) -> Content {
    Content::ImageUrl(ImageUrlContent {
        image_url: url.into(),
        detail,
    })
}

/// Reference an uploaded file.
pub fn file_content(file_id: impl Into<String>) -> Content {
    Content::File(FileContent {
        file_id: file_id.into(),
    })
}

/// Anything that can become the content parts of a message.
pub trait IntoContentParts {
    /// Convert into content parts.
    fn into_content_parts(self) -> Vec<Content>;
}

impl IntoContentParts for &str {
    fn into_content_parts(self) -> Vec<Content> {
        vec![Content::from(self)]
    }
}

impl IntoContentParts for String {
    fn into_content_parts(self) -> Vec<Content> {
        vec![Content::from(self)]
    }
}

impl IntoContentParts for Content {
    fn into_content_parts(self) -> Vec<Content> {
        vec![self]
    }
}

impl IntoContentParts for Vec<Content> {
    fn into_content_parts(self) -> Vec<Content> {
        self
    }
}

impl<const N: usize> IntoContentParts for [Content; N] {
    fn into_content_parts(self) -> Vec<Content> {
        self.into()
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Ordered content parts.
    pub content: Vec<Content>,
    /// Reasoning trace of an assistant turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    /// Author.
    pub role: MessageRole,
    /// Tool calls issued by an assistant turn.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Opaque encrypted reasoning returned by the server.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub encrypted_content: String,
}

impl Message {
    /// Create a message from a role and content parts.
    pub fn new(role: MessageRole, parts: impl IntoContentParts) -> Self {
        Self {
            role,
            content: parts.into_content_parts(),
            ..Self::default()
        }
    }

    /// Append a content part.
    #[must_use]
    pub fn with_part(mut self, part: impl Into<Content>) -> Self {
        self.content.push(part.into());
        self
    }

    /// Attach tool calls.
    #[must_use]
    pub fn with_tool_calls(mut self, calls: impl IntoIterator<Item = ToolCall>) -> Self {
        self.tool_calls.extend(calls);
        self
    }

    /// Attach a reasoning trace.
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning_content = Some(reasoning.into());
        self
    }

    /// Concatenation of all text parts.
    pub fn text(&self) -> String {
        self.content.iter().filter_map(Content::as_text).collect()
    }

    /// Check the message carries at least one content part or tool call.
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() && self.tool_calls.is_empty() {
            return Err(XaiError::validation(
                "message must have at least one content part or tool call",
            ));
        }
        Ok(())
    }
}

/// A user message.
pub fn user(parts: impl IntoContentParts) -> Message {
    Message::new(MessageRole::User, parts)
}

/// A system message.
pub fn system(parts: impl IntoContentParts) -> Message {
    Message::new(MessageRole::System, parts)
}

/// An assistant message.
pub fn assistant(parts: impl IntoContentParts) -> Message {
    Message::new(MessageRole::Assistant, parts)
}

/// A tool result message.
///
/// The wire message has no slot for the tool-call id; callers that need the
/// correlation can embed the id in the payload.
pub fn tool_result(result: impl Into<String>) -> Message {
    let result: String = result.into();
    Message::new(MessageRole::Tool, result)
}
