//! # xai-sdk
//!
//! Chat client for the xAI gRPC API.
//!
//! ```rust
//! use std::sync::Arc;
//! use xai_sdk::prelude::*;
//! use xai_sdk::chat::mock::MockChatService;
//!
//! # fn main() -> Result<()> {
//! // Any `ChatService` works as the transport: a generated gRPC stub in
//! // production, a scripted mock here.
//! let transport = Arc::new(MockChatService::new());
//! let client = Client::new(transport, ClientOptions::default().with_api_key("xai-..."))?;
//!
//! let mut chat = client.chat().create(
//!     "grok-4",
//!     [with_messages([system("Be terse.")]), with_max_tokens(128)],
//! );
//! chat.append(user("What is the capital of France?"));
//! assert_eq!(chat.messages().len(), 2);
//!
//! // `sample`, `stream`, `defer` and `parse::<T>` each take a `CallContext`.
//! let _ctx = CallContext::new();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: wire types, [`CallContext`], the [`ChatService`] seam, errors
//! - [`streaming`]: chunk aggregation into [`Response`](streaming::Response) views
//! - [`output`]: JSON-schema derivation for structured output
//! - [`retries`]: retry policy and the [`RetryService`](retries::RetryService) layer
//! - [`chat`]: sessions, streams, deferred polling, span attributes
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `otel` | OTLP export and `tracing-subscriber` setup ([`telemetry`]) | ✅ |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod config;
pub mod interceptor;

/// Subscriber and OTLP exporter setup.
#[cfg(feature = "otel")]
#[cfg_attr(docsrs, doc(cfg(feature = "otel")))]
pub mod telemetry;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Wire types, call context, the RPC seam and errors.
pub use xai_sdk_core as core;

/// Chunk aggregation.
pub use xai_sdk_streaming as streaming;

/// Structured output schemas.
pub use xai_sdk_output as output;

/// Retry policy.
pub use xai_sdk_retries as retries;

/// Chat sessions.
pub use xai_sdk_chat as chat;

// ============================================================================
// Flat Re-exports
// ============================================================================

pub use client::Client;
pub use config::{
    ClientOptions, API_KEY_ENV, DEFAULT_API_HOST, DEFAULT_MANAGEMENT_HOST, DEFAULT_TIMEOUT,
    MANAGEMENT_KEY_ENV,
};
pub use interceptor::{AuthLayer, TimeoutLayer};

pub use xai_sdk_core::{CallContext, ChatService, ChunkStream, Result, XaiError};

pub use xai_sdk_chat::{
    ChatClient, ChatSession, ChatStream, Chunk, DeferredOptions, ParseError, Response,
};

// ============================================================================
// Prelude
// ============================================================================

/// Common imports.
///
/// ```rust
/// use xai_sdk::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::ClientOptions;

    pub use xai_sdk_core::messages::{assistant, system, tool_result, user};
    pub use xai_sdk_core::{CallContext, Result, XaiError};

    pub use xai_sdk_chat::options::*;
    pub use xai_sdk_chat::{
        ChatClient, ChatSession, ChatStream, Chunk, DeferredOptions, ParseError, Response,
    };

    pub use xai_sdk_output::JsonSchema;
    pub use xai_sdk_retries::RetryConfig;
}
