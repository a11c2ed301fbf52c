//! Response DTOs.

use serde::{Deserialize, Serialize};

use projecthub_service::audit::RecordOutcome;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Unread counter response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of unread notifications.
    pub count: u64,
}

/// Outcome of recording a membership action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeResponse {
    /// Whether the action was recorded or already present.
    pub outcome: RecordOutcome,
}

/// Derived completion state of one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// All eligible members previewed the file.
    pub fully_viewed: bool,
    /// All eligible members downloaded the file.
    pub fully_downloaded: bool,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}
