//! # xai-sdk-streaming
//!
//! Aggregation of streamed chat completions.
//!
//! The server sends a completion as a sequence of chunks, each carrying
//! per-output deltas plus repeated metadata. This crate folds those chunks
//! into one evolving [`Response`]:
//!
//! - **[`Response`]**: the aggregated response, with accessors that read a
//!   selected output or every output
//! - **[`Chunk`]**: the deltas of the most recent chunk
//! - **[`pool`]**: the process-wide builder pool backing deferred text
//!
//! ## Example
//!
//! ```rust
//! use xai_sdk_core::messages::{CompletionOutputChunk, Delta, GetChatCompletionChunk};
//! use xai_sdk_streaming::Response;
//!
//! let response = Response::streaming(Some(0));
//! for text in ["Hel", "lo"] {
//!     response.process_chunk(&GetChatCompletionChunk {
//!         outputs: vec![CompletionOutputChunk {
//!             delta: Delta { content: text.into(), ..Default::default() },
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     });
//! }
//! assert_eq!(response.content(), "Hello");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chunk;
pub mod pool;
pub mod response;

pub use chunk::Chunk;
pub use response::Response;
