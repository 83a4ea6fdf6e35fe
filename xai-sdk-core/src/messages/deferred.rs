//! Deferred and stored completion messages.

use serde::{Deserialize, Serialize};

use super::response::GetChatCompletionResponse;

wire_enum! {
    /// Lifecycle of a deferred completion.
    pub enum DeferredStatus {
        /// Unset.
        #[default]
        Invalid = 0 => "INVALID_DEFERRED_STATUS",
        /// Finished; the response is attached.
        Done = 1 => "DONE",
        /// Dropped by the server before finishing.
        Expired = 2 => "EXPIRED",
        /// Still running.
        Pending = 3 => "PENDING",
    }
}

/// Reply to a deferred start call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartDeferredResponse {
    /// Identifier to poll with.
    pub request_id: String,
}

/// Poll request for a deferred completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetDeferredRequest {
    /// Identifier returned by the start call.
    pub request_id: String,
}

/// Poll result for a deferred completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetDeferredCompletionResponse {
    /// Current status.
    pub status: DeferredStatus,
    /// The completion, present when `status` is [`DeferredStatus::Done`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<GetChatCompletionResponse>,
}

impl GetDeferredCompletionResponse {
    /// A pending poll result.
    pub fn pending() -> Self {
        Self {
            status: DeferredStatus::Pending,
            response: None,
        }
    }

    /// A finished poll result.
    pub fn done(response: GetChatCompletionResponse) -> Self {
        Self {
            status: DeferredStatus::Done,
            response: Some(response),
        }
    }

    /// An expired poll result.
    pub fn expired() -> Self {
        Self {
            status: DeferredStatus::Expired,
            response: None,
        }
    }
}

/// Fetch a stored completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetStoredCompletionRequest {
    /// Stored response identifier.
    pub response_id: String,
}

/// Delete a stored completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteStoredCompletionRequest {
    /// Stored response identifier.
    pub response_id: String,
}

/// Reply to a stored-completion delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteStoredCompletionResponse {
    /// Identifier of the deleted response.
    pub response_id: String,
}
