//! # xai-sdk-output
//!
//! Structured output support for xai-sdk.
//!
//! Types deriving [`schemars::JsonSchema`] can be turned into a
//! schema-constrained [`ResponseFormat`](xai_sdk_core::ResponseFormat).
//! Derived schemas are cached per type for the life of the process.
//!
//! ## Example
//!
//! ```rust
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use xai_sdk_output::response_format_for;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Weather {
//!     city: String,
//!     celsius: f64,
//! }
//!
//! let format = response_format_for::<Weather>().unwrap();
//! assert!(format.is_json_schema());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod schema;

pub use schema::{cached_schemas, json_schema_for, response_format_for};

// Re-exported so callers can derive schemas without a direct dependency.
pub use schemars::{self, JsonSchema};
