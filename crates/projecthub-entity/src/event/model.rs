//! Scheduled event entity model.
//!
//! Event CRUD itself lives outside the notification core; only the fields
//! the aggregator reads (soft-delete flag, event date) matter here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A scheduled project event, parent of its per-recipient notices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Event topic.
    pub topic: String,
    /// The date the event takes place.
    pub event_date: Option<NaiveDate>,
    /// The user who created the event.
    pub created_by: String,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag; notices of deleted events are never aggregated.
    pub deleted: bool,
}
