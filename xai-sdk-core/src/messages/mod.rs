//! Wire types for the chat service.
//!
//! These mirror the protobuf messages of the chat API. Enums serialize with
//! their protobuf wire names (`ROLE_USER`, `REASON_STOP`, ...) and every knob
//! that is optional on the wire is an `Option` here, so "unset" and "zero" stay
//! distinct.

/// Declares a closed protobuf enum with its wire names and integer values.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[repr(i32)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant = $value, )+
        }

        impl $name {
            /// Every variant, in wire-value order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The protobuf wire name.
            pub const fn as_str_name(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Parse a protobuf wire name.
            pub fn from_str_name(name: &str) -> Option<Self> {
                match name {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// The protobuf integer value.
            pub const fn value(self) -> i32 {
                self as i32
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str_name())
            }
        }
    };
}

mod content;
mod deferred;
mod request;
mod response;
mod search;
mod tools;

pub use content::{
    assistant, file_content, image_content, system, text_content, tool_result, user, Content,
    FileContent, ImageDetail, ImageUrlContent, IntoContentParts, Message, MessageRole,
};
pub use deferred::{
    DeferredStatus, DeleteStoredCompletionRequest, DeleteStoredCompletionResponse,
    GetDeferredCompletionResponse, GetDeferredRequest, GetStoredCompletionRequest,
    StartDeferredResponse,
};
pub use request::{FormatType, GetCompletionsRequest, ReasoningEffort, ResponseFormat};
pub use response::{
    CompletionMessage, CompletionOutput, CompletionOutputChunk, Delta, FinishReason,
    GetChatCompletionChunk, GetChatCompletionResponse,
};
pub use search::{NewsSource, RssSource, SearchMode, SearchParameters, Source, WebSource, XSource};
pub use tools::{
    CodeExecution, CollectionsSearch, DocumentSearch, FunctionCall, FunctionDef, Mcp, Tool,
    ToolCall, ToolCallType, ToolChoice, ToolMode, WebSearch, XSearch,
};
