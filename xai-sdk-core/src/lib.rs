//! # xai-sdk-core
//!
//! Core types, the RPC seam, and error handling for the xai-sdk workspace.
//!
//! This crate provides the foundational types used by every other crate:
//!
//! - **Messages**: wire-level request, response, chunk, tool and deferred types
//! - **Errors**: the [`XaiError`] taxonomy with retryability classification
//! - **Context**: [`CallContext`] carrying cancellation, deadline and metadata
//! - **Service**: the [`ChatService`] / [`ChunkStream`] traits every transport
//!   and layer implements
//!
//! ## Example
//!
//! ```rust
//! use xai_sdk_core::messages::{user, system, GetCompletionsRequest};
//!
//! let mut request = GetCompletionsRequest::new("grok-4");
//! request.messages.push(system("You are terse."));
//! request.messages.push(user("Hello!"));
//!
//! assert_eq!(request.messages.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod messages;
pub mod service;
pub mod usage;

pub use context::CallContext;
pub use errors::{Result, RpcError, XaiError};
pub use messages::{
    // Request side
    Content, FormatType, GetCompletionsRequest, ImageDetail, Message, MessageRole,
    ReasoningEffort, ResponseFormat,
    // Tools
    FunctionCall, FunctionDef, Tool, ToolCall, ToolCallType, ToolChoice, ToolMode,
    // Search
    SearchMode, SearchParameters, Source,
    // Response side
    CompletionMessage, CompletionOutput, FinishReason, GetChatCompletionResponse,
    // Streaming
    CompletionOutputChunk, Delta, GetChatCompletionChunk,
    // Deferred and stored
    DeferredStatus, DeleteStoredCompletionRequest, DeleteStoredCompletionResponse,
    GetDeferredCompletionResponse, GetDeferredRequest, GetStoredCompletionRequest,
    StartDeferredResponse,
};
pub use service::{ChatService, ChunkStream};
pub use usage::SamplingUsage;

/// Re-export of the gRPC status types used across the RPC seam.
pub use tonic::{Code, Status};

/// SDK version reported in request metadata.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SDK language reported in request metadata.
pub const SDK_LANGUAGE: &str = "rust";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let request = GetCompletionsRequest::new("grok-4");
        assert_eq!(request.model, "grok-4");
        assert!(request.messages.is_empty());
    }

    #[test]
    fn test_sdk_metadata_constants() {
        assert!(!SDK_VERSION.is_empty());
        assert_eq!(SDK_LANGUAGE, "rust");
    }
}
