//! Request DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use projecthub_core::error::AppError;

/// Run `validator` checks, mapping failures to a validation error.
pub fn validated<T: Validate>(req: T) -> Result<T, AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;
    Ok(req)
}

/// Body for recording a preview/download/upload/delete against a file.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordActionRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Folder containing the file.
    #[validate(length(min = 1))]
    pub folder: String,
    /// The file name.
    #[validate(length(min = 1))]
    pub file_name: String,
    /// The acting user.
    #[validate(length(min = 1))]
    pub username: String,
    /// When the action occurred; defaults to the server clock.
    pub acted_at: Option<DateTime<Utc>>,
}

impl RecordActionRequest {
    /// The action timestamp, falling back to now.
    pub fn at(&self) -> DateTime<Utc> {
        self.acted_at.unwrap_or_else(Utc::now)
    }
}

/// Body for folder lifecycle records.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FolderActionRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// The folder name.
    #[validate(length(min = 1))]
    pub folder: String,
    /// The acting user.
    #[validate(length(min = 1))]
    pub username: String,
}

/// Body for recording removal of an external link.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LinkActionRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Folder the link lived in, if any.
    pub folder: Option<String>,
    /// The link display name.
    #[validate(length(min = 1))]
    pub link_name: String,
    /// The acting user.
    #[validate(length(min = 1))]
    pub username: String,
}

/// Query selecting a viewer scope.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScopeQuery {
    /// The viewing user.
    #[validate(length(min = 1))]
    pub username: String,
    /// Project scope; absent means the global dashboard.
    pub project_id: Option<Uuid>,
}

/// Body for acknowledging an event notice.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MarkEventReadRequest {
    /// The acknowledging user.
    #[validate(length(min = 1))]
    pub username: String,
    /// The project the notice belongs to.
    pub project_id: Uuid,
}

/// Body for acknowledging a chat mention.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MarkMentionReadRequest {
    /// The acknowledging user.
    #[validate(length(min = 1))]
    pub username: String,
}

/// Body for creating a scheduled event.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEventRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// Event topic.
    #[validate(length(min = 1))]
    pub topic: String,
    /// The date the event takes place.
    pub event_date: Option<NaiveDate>,
    /// The creating user.
    #[validate(length(min = 1))]
    pub created_by: String,
}

/// Body for posting a chat message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostMessageRequest {
    /// Owning project.
    pub project_id: Uuid,
    /// The message author.
    #[validate(length(min = 1))]
    pub username: String,
    /// Message text.
    #[validate(length(min = 1))]
    pub message: String,
    /// Client-generated idempotency key.
    pub client_key: Option<Uuid>,
}

/// Body for creating a project with its roster.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project display name.
    #[validate(length(min = 1))]
    pub name: String,
    /// The creating user.
    #[validate(length(min = 1))]
    pub created_by: String,
    /// Member roster (the creator is included automatically).
    pub members: Vec<String>,
}

/// Query parameters for the project activity log.
#[derive(Debug, Clone, Deserialize)]
pub struct LogQuery {
    /// Restrict to one folder.
    pub folder: Option<String>,
}

/// Query parameters for the live-feed WebSocket.
#[derive(Debug, Clone, Deserialize)]
pub struct WsQuery {
    /// The viewing user.
    pub username: String,
    /// Project scope; absent means the global dashboard.
    pub project_id: Option<Uuid>,
}
