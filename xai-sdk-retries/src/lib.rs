//! # xai-sdk-retries
//!
//! Retry policy for xai-sdk RPCs.
//!
//! Every channel carries the same default policy: up to five attempts,
//! exponential backoff between 100 ms and 1 s, and only `UNAVAILABLE`
//! treated as transient.
//!
//! ## Core Concepts
//!
//! - **[`RetryConfig`]**: Configure retry behavior
//! - **[`WaitStrategy`]**: Define how long to wait between attempts
//! - **[`RetryCondition`]**: Determine which status codes are retryable
//! - **[`with_retry`]**: Execute an RPC with automatic retries
//! - **[`RetryService`]**: A chat service layer with built-in retries
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xai_sdk_retries::{RetryConfig, RetryService};
//!
//! let service = RetryService::new(Arc::new(transport), RetryConfig::default());
//! let response = service.get_completion(&ctx, request).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod executor;
pub mod service;

pub use config::{RetryCondition, RetryConfig, WaitStrategy};
pub use executor::{with_retry, with_retry_state, RetryState};
pub use service::RetryService;
