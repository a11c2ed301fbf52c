//! Change events emitted by the stores after each successful mutation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The store table family a change event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// File audit records and their membership sets.
    Audit,
    /// Scheduled-event notices.
    EventNotices,
    /// Chat messages and mentions.
    Chat,
}

/// A membership-producing audit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    /// The actor opened a preview of the file.
    Preview,
    /// The actor downloaded the file.
    Download,
}

impl MembershipAction {
    /// Stable string form used in dedup keys and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Download => "download",
        }
    }
}

/// A single change notification, keyed by subject identity.
///
/// `client_key` carries the client-generated idempotency key of the write
/// that produced the event, echoed back verbatim so a session can match a
/// push event against its own optimistic placeholder exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A new upload audit record was inserted.
    FileUploaded {
        project_id: Uuid,
        folder: String,
        file_name: String,
        uploaded_by: String,
        uploaded_at: DateTime<Utc>,
    },
    /// A delete audit record was inserted for a file.
    FileDeleted {
        project_id: Uuid,
        folder: String,
        file_name: String,
        deleted_by: String,
        deleted_at: DateTime<Utc>,
    },
    /// A username was appended to a preview/download membership set.
    MembershipAdded {
        project_id: Uuid,
        folder: String,
        file_name: String,
        action: MembershipAction,
        username: String,
        acked_at: DateTime<Utc>,
    },
    /// An event notice was created for a recipient.
    NoticeCreated {
        notice_id: Uuid,
        project_id: Uuid,
        event_id: Uuid,
        topic: String,
        created_by: String,
        recipient: String,
        event_date: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    },
    /// An event notice was acknowledged by its recipient.
    NoticeRead {
        project_id: Uuid,
        event_id: Uuid,
        recipient: String,
    },
    /// A chat message was posted.
    MessagePosted {
        message_id: Uuid,
        project_id: Uuid,
        username: String,
        message: String,
        client_key: Option<Uuid>,
        created_at: DateTime<Utc>,
    },
    /// A chat mention row was created for a recipient.
    MentionCreated {
        mention_id: Uuid,
        project_id: Uuid,
        message_id: Uuid,
        mentioned_by: String,
        mentioned_user: String,
        message: String,
        client_key: Option<Uuid>,
        created_at: DateTime<Utc>,
    },
    /// A chat mention was acknowledged by its recipient.
    MentionRead {
        project_id: Uuid,
        mention_id: Uuid,
        mentioned_user: String,
    },
}

impl ChangeEvent {
    /// The table family this event belongs to.
    pub fn source(&self) -> ChangeSource {
        match self {
            Self::FileUploaded { .. } | Self::FileDeleted { .. } | Self::MembershipAdded { .. } => {
                ChangeSource::Audit
            }
            Self::NoticeCreated { .. } | Self::NoticeRead { .. } => ChangeSource::EventNotices,
            Self::MessagePosted { .. }
            | Self::MentionCreated { .. }
            | Self::MentionRead { .. } => ChangeSource::Chat,
        }
    }

    /// The project the event belongs to.
    pub fn project_id(&self) -> Uuid {
        match self {
            Self::FileUploaded { project_id, .. }
            | Self::FileDeleted { project_id, .. }
            | Self::MembershipAdded { project_id, .. }
            | Self::NoticeCreated { project_id, .. }
            | Self::NoticeRead { project_id, .. }
            | Self::MessagePosted { project_id, .. }
            | Self::MentionCreated { project_id, .. }
            | Self::MentionRead { project_id, .. } => *project_id,
        }
    }

    /// The client idempotency key echoed back with this event, if any.
    pub fn client_key(&self) -> Option<Uuid> {
        match self {
            Self::MessagePosted { client_key, .. } | Self::MentionCreated { client_key, .. } => {
                *client_key
            }
            _ => None,
        }
    }

    /// Subject-identity key used to suppress rapid duplicate deliveries.
    pub fn dedup_key(&self) -> String {
        match self {
            Self::FileUploaded {
                project_id,
                file_name,
                ..
            } => format!("upload:{project_id}:{file_name}"),
            Self::FileDeleted {
                project_id,
                file_name,
                ..
            } => format!("delete:{project_id}:{file_name}"),
            Self::MembershipAdded {
                project_id,
                file_name,
                action,
                username,
                ..
            } => format!("member:{project_id}:{file_name}:{}:{username}", action.as_str()),
            Self::NoticeCreated { notice_id, .. } => format!("notice:{notice_id}"),
            Self::NoticeRead {
                event_id,
                recipient,
                ..
            } => format!("notice_read:{event_id}:{recipient}"),
            Self::MessagePosted { message_id, .. } => format!("message:{message_id}"),
            Self::MentionCreated { mention_id, .. } => format!("mention:{mention_id}"),
            Self::MentionRead { mention_id, .. } => format!("mention_read:{mention_id}"),
        }
    }
}

/// Equality filter applied to a change-feed subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeFilter {
    /// Restrict to a single project; `None` matches every project.
    pub project_id: Option<Uuid>,
    /// Restrict to a single source table family; `None` matches all.
    pub source: Option<ChangeSource>,
}

impl ChangeFilter {
    /// Filter matching every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching a single project across all sources.
    pub fn project(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            source: None,
        }
    }

    /// Whether the event passes this filter.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if let Some(project_id) = self.project_id {
            if event.project_id() != project_id {
                return false;
            }
        }
        if let Some(source) = self.source {
            if event.source() != source {
                return false;
            }
        }
        true
    }
}
