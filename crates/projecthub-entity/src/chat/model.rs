//! Chat message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A message posted to a project chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Message author.
    pub username: String,
    /// Message text.
    pub message: String,
    /// Client-generated idempotency key, echoed through the change feed
    /// so the sender can match the server copy against its local
    /// placeholder exactly.
    pub client_key: Option<Uuid>,
    /// When the message was posted.
    pub created_at: DateTime<Utc>,
}
