//! Project entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A collaborative project workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    /// Unique project identifier.
    pub id: Uuid,
    /// Project display name.
    pub name: String,
    /// The user who created the project.
    pub created_by: String,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
}

/// A roster entry tying a user to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectMember {
    /// The project.
    pub project_id: Uuid,
    /// The member's username.
    pub username: String,
    /// When the member was added.
    pub added_at: DateTime<Utc>,
}
