//! Notification item models and the grouped per-viewer feed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind discriminant of a notification item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A file upload the viewer has not seen.
    FileUpload,
    /// A scheduled-event notice.
    EventNotice,
    /// A chat mention of the viewer.
    ChatMention,
}

/// Identity key for de-duplication inside an aggregated list.
///
/// Uploads key on file name alone (folder-independent); event notices on
/// the parent event id; mentions on the mention row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationKey {
    /// Item kind.
    pub kind: NotificationKind,
    /// Owning project.
    pub project_id: Uuid,
    /// Kind-specific stable identifier.
    pub stable_id: String,
}

/// An upload the viewer has neither performed nor previewed/downloaded.
///
/// Unread state is always derived from audit membership, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadNotice {
    /// Owning project.
    pub project_id: Uuid,
    /// Folder the file was uploaded into.
    pub folder: String,
    /// The uploaded file name.
    pub file_name: String,
    /// Uploading user.
    pub uploaded_by: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
}

/// A per-recipient notice about a scheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventNotice {
    /// Unique notice identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// The parent scheduled event.
    pub event_id: Uuid,
    /// Event topic, denormalized for display.
    pub topic: String,
    /// The user who created the event.
    pub created_by: String,
    /// The user this notice is addressed to.
    pub recipient: String,
    /// Date of the parent event, used for the "already past" rule.
    pub event_date: Option<NaiveDate>,
    /// When the notice was created.
    pub created_at: DateTime<Utc>,
    /// Whether the recipient acknowledged the notice.
    pub read: bool,
}

/// A chat mention addressed to the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChatMention {
    /// Unique mention identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// The chat message containing the mention.
    pub message_id: Uuid,
    /// The message author.
    pub mentioned_by: String,
    /// The mentioned user.
    pub mentioned_user: String,
    /// Message text, denormalized for display.
    pub message: String,
    /// When the message was posted.
    pub created_at: DateTime<Utc>,
    /// Whether the mentioned user acknowledged the mention.
    pub read: bool,
}

/// A notification item of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationItem {
    /// An unread upload.
    FileUpload(FileUploadNotice),
    /// An event notice.
    EventNotice(EventNotice),
    /// A chat mention.
    ChatMention(ChatMention),
}

impl NotificationItem {
    /// The identity key of this item.
    pub fn key(&self) -> NotificationKey {
        match self {
            Self::FileUpload(n) => NotificationKey {
                kind: NotificationKind::FileUpload,
                project_id: n.project_id,
                stable_id: n.file_name.clone(),
            },
            Self::EventNotice(n) => NotificationKey {
                kind: NotificationKind::EventNotice,
                project_id: n.project_id,
                stable_id: n.event_id.to_string(),
            },
            Self::ChatMention(n) => NotificationKey {
                kind: NotificationKind::ChatMention,
                project_id: n.project_id,
                stable_id: n.id.to_string(),
            },
        }
    }
}

/// The grouped per-viewer notification feed.
///
/// Three sub-lists, each sorted newest-first by its own timestamp. Kinds
/// are never interleave-sorted; only the combined unread count crosses
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationFeed {
    /// Unread uploads, newest first.
    pub uploads: Vec<FileUploadNotice>,
    /// Unread event notices, newest first.
    pub events: Vec<EventNotice>,
    /// Unread chat mentions, newest first.
    pub mentions: Vec<ChatMention>,
}

impl NotificationFeed {
    /// Whether the feed holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.events.is_empty() && self.mentions.is_empty()
    }

    /// Total number of items across all kinds.
    pub fn len(&self) -> usize {
        self.uploads.len() + self.events.len() + self.mentions.len()
    }

    /// Whether an item with the given identity key is present.
    pub fn contains(&self, key: &NotificationKey) -> bool {
        match key.kind {
            NotificationKind::FileUpload => self
                .uploads
                .iter()
                .any(|n| n.project_id == key.project_id && n.file_name == key.stable_id),
            NotificationKind::EventNotice => self
                .events
                .iter()
                .any(|n| n.project_id == key.project_id && n.event_id.to_string() == key.stable_id),
            NotificationKind::ChatMention => self
                .mentions
                .iter()
                .any(|n| n.project_id == key.project_id && n.id.to_string() == key.stable_id),
        }
    }

    /// Combined unread tally: derived-unread uploads, unacknowledged
    /// notices whose event date has not already passed, and
    /// unacknowledged mentions. "Past" is evaluated against `now`.
    pub fn unread_count(&self, now: DateTime<Utc>) -> u64 {
        let today = now.date_naive();
        let events = self
            .events
            .iter()
            .filter(|n| !n.read && !is_past(n.event_date, today))
            .count();
        let mentions = self.mentions.iter().filter(|n| !n.read).count();
        (self.uploads.len() + events + mentions) as u64
    }

    /// Restore the per-kind newest-first ordering with deterministic
    /// tie-breaks, so identical inputs always render identically.
    pub fn sort(&mut self) {
        self.uploads.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.file_name.cmp(&b.file_name))
                .then_with(|| a.project_id.cmp(&b.project_id))
        });
        self.events.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        self.mentions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Insert or replace an upload by its folder-independent identity.
    pub fn upsert_upload(&mut self, notice: FileUploadNotice) {
        self.uploads
            .retain(|n| !(n.project_id == notice.project_id && n.file_name == notice.file_name));
        self.uploads.push(notice);
        self.sort();
    }

    /// Remove an upload by project and file name.
    pub fn remove_upload(&mut self, project_id: Uuid, file_name: &str) {
        self.uploads
            .retain(|n| !(n.project_id == project_id && n.file_name == file_name));
    }

    /// Insert an event notice unless its identity key is already present.
    pub fn insert_event_notice(&mut self, notice: EventNotice) {
        if !self
            .events
            .iter()
            .any(|n| n.project_id == notice.project_id && n.event_id == notice.event_id)
        {
            self.events.push(notice);
            self.sort();
        }
    }

    /// Remove an event notice by parent event id.
    pub fn remove_event_notice(&mut self, project_id: Uuid, event_id: Uuid) {
        self.events
            .retain(|n| !(n.project_id == project_id && n.event_id == event_id));
    }

    /// Insert a mention unless its identity key is already present.
    pub fn insert_mention(&mut self, mention: ChatMention) {
        if !self.mentions.iter().any(|n| n.id == mention.id) {
            self.mentions.push(mention);
            self.sort();
        }
    }

    /// Remove a mention by row id.
    pub fn remove_mention(&mut self, mention_id: Uuid) {
        self.mentions.retain(|n| n.id != mention_id);
    }
}

fn is_past(event_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    event_date.map(|d| d < today).unwrap_or(false)
}
