//! Error types for xai-sdk.
//!
//! Every session operation returns [`XaiError`]. Transport failures keep their
//! gRPC status code so callers can branch on it, and [`XaiError::is_retryable`]
//! mirrors the retryable set of the default retry policy.

use bytes::Bytes;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tonic::{Code, Status};

/// The main error type for xai-sdk operations.
#[derive(Error, Debug)]
pub enum XaiError {
    /// The caller supplied a structurally invalid request.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An RPC failed with a gRPC status.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// A deferred completion did not finish before the client-side deadline.
    #[error("deferred request timed out after {timeout:?}")]
    DeferredTimeout {
        /// The timeout that was exhausted.
        timeout: Duration,
    },

    /// The server expired a deferred completion before it finished.
    #[error("deferred request {request_id} expired")]
    DeferredExpired {
        /// Identifier returned by the start call.
        request_id: String,
    },

    /// The server reported a deferred status this client does not understand.
    #[error("unknown deferred status {0}")]
    UnknownDeferredStatus(String),

    /// The call context was cancelled.
    #[error("call cancelled")]
    Cancelled,

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A tool call could not be decoded.
    #[error("invalid tool call: {0}")]
    ToolCall(String),

    /// A JSON schema could not be derived.
    #[error("schema error: {0}")]
    Schema(String),
}

/// Result type alias using XaiError.
pub type Result<T> = std::result::Result<T, XaiError>;

impl XaiError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a tool-call error.
    pub fn tool_call(message: impl Into<String>) -> Self {
        Self::ToolCall(message.into())
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Convert a gRPC status, mapping `CANCELLED` to [`XaiError::Cancelled`].
    pub fn from_status(status: Status) -> Self {
        if status.code() == Code::Cancelled {
            Self::Cancelled
        } else {
            Self::Rpc(RpcError::from(status))
        }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// The gRPC code, if this is an RPC error.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc(e) => Some(e.code()),
            Self::Cancelled => Some(Code::Cancelled),
            _ => None,
        }
    }

    /// The underlying RPC error, if any.
    pub fn as_rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Status> for XaiError {
    fn from(status: Status) -> Self {
        Self::from_status(status)
    }
}

/// A failed RPC, carried as code, message and structured details.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    code: Code,
    message: String,
    details: Bytes,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rpc error: code = {:?}", self.code)?;
        if !self.message.is_empty() {
            write!(f, " desc = {}", self.message)?;
        }
        Ok(())
    }
}

impl RpcError {
    /// Create a new RPC error without details.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Bytes::new(),
        }
    }

    /// Attach encoded status details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<Bytes>) -> Self {
        self.details = details.into();
        self
    }

    /// The gRPC status code.
    pub fn code(&self) -> Code {
        self.code
    }

    /// The status message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The encoded status details (empty when absent).
    pub fn details(&self) -> &[u8] {
        &self.details
    }

    /// Rebuild the canonical gRPC status for interoperability.
    pub fn status(&self) -> Status {
        Status::with_details(self.code, self.message.clone(), self.details.clone())
    }

    /// True iff the code is `UNAVAILABLE` or `DEADLINE_EXCEEDED`.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, Code::Unavailable | Code::DeadlineExceeded)
    }
}

impl From<Status> for RpcError {
    fn from(status: Status) -> Self {
        Self {
            code: status.code(),
            message: status.message().to_string(),
            details: Bytes::copy_from_slice(status.details()),
        }
    }
}

impl From<RpcError> for Status {
    fn from(err: RpcError) -> Self {
        err.status()
    }
}
