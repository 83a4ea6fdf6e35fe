//! Errors specific to structured parsing.

use thiserror::Error;
use xai_sdk_core::XaiError;
use xai_sdk_streaming::Response;

/// Error returned by [`ChatSession::parse`](crate::ChatSession::parse).
///
/// A decode failure still carries the response the server sent, so callers
/// can look at the raw content.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The call failed before a response was received.
    #[error(transparent)]
    Call(#[from] XaiError),

    /// The response content is not valid JSON for the target type.
    #[error("failed to decode structured response: {source}")]
    Decode {
        /// The JSON error.
        source: serde_json::Error,
        /// The response that failed to decode.
        response: Response,
    },
}

impl ParseError {
    /// The received response, if the call got that far.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Call(_) => None,
            Self::Decode { response, .. } => Some(response),
        }
    }

    /// Consume the error, returning the received response, if any.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Call(_) => None,
            Self::Decode { response, .. } => Some(response),
        }
    }
}
