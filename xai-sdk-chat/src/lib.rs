//! # xai-sdk-chat
//!
//! Chat sessions for xai-sdk.
//!
//! - **[`ChatClient`]**: creates sessions and exposes stored / deferred RPCs
//! - **[`ChatSession`]**: sample, stream, defer and parse against a request
//!   template that is cloned for every call
//! - **[`ChatStream`]**: chunk-by-chunk aggregation with scoped cleanup
//! - **[`options`]**: the `with_*` option set applied at session creation
//!
//! Every session call opens a client span named `chat.<operation> <model>`
//! on the global OpenTelemetry tracer, carrying `gen_ai.*` attributes.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xai_sdk_chat::mock::MockChatService;
//! use xai_sdk_chat::options::{with_max_tokens, with_messages};
//! use xai_sdk_chat::ChatClient;
//! use xai_sdk_core::messages::{system, user};
//!
//! let client = ChatClient::new(Arc::new(MockChatService::new()));
//! let mut session = client.create(
//!     "grok-4",
//!     [with_messages([system("Be brief.")]), with_max_tokens(64)],
//! );
//! session.append(user("What is the capital of France?"));
//! assert_eq!(session.messages().len(), 2);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod deferred;
pub mod error;
pub mod mock;
pub mod options;
pub mod session;
pub mod stream;
pub mod telemetry;

pub use client::ChatClient;
pub use deferred::{DeferredOptions, DEFAULT_DEFERRED_INTERVAL, DEFAULT_DEFERRED_TIMEOUT};
pub use error::ParseError;
pub use options::{ChatOption, SessionMetadata};
pub use session::ChatSession;
pub use stream::ChatStream;
pub use xai_sdk_streaming::{Chunk, Response};
