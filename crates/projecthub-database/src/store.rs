//! Durable store boundary contracts.
//!
//! The audit/notification core talks to persistence exclusively through
//! these traits. The store, not the caller, enforces the
//! at-most-one-record-per-(subject, membership-action) invariant and the
//! atomicity of add-member-if-absent, so concurrent writers never need a
//! lock of their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use projecthub_core::result::AppResult;
use projecthub_entity::audit::{AuditAction, AuditRecord, NewAuditAction, Subject};
use projecthub_entity::chat::ChatMessage;
use projecthub_entity::event::ProjectEvent;
use projecthub_entity::notification::{ChatMention, EventNotice};
use projecthub_entity::project::Project;

/// Audit record persistence.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a new immutable record (upload, delete, lifecycle actions).
    /// Each occurrence is its own record; never merged.
    async fn insert_action(&self, action: &NewAuditAction) -> AppResult<AuditRecord>;

    /// Find or create the single membership record for (subject, action).
    ///
    /// Losing the creation race to a concurrent writer surfaces as
    /// `ErrorKind::Conflict`; the caller re-reads and retries.
    async fn upsert_membership_record(
        &self,
        subject: &Subject,
        action: AuditAction,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<AuditRecord>;

    /// Atomically append a username to a record's membership set.
    ///
    /// Returns `true` if the member was inserted, `false` if already
    /// present. Never fails on duplicates.
    async fn add_member(&self, record_id: Uuid, username: &str, at: DateTime<Utc>)
    -> AppResult<bool>;

    /// The original uploader of a subject, if an upload was recorded.
    async fn find_uploader(&self, subject: &Subject) -> AppResult<Option<String>>;

    /// All audit records for a project, optionally restricted to a
    /// folder, newest first, membership sets populated.
    async fn query_project_actions(
        &self,
        project_id: Uuid,
        folder: Option<&str>,
    ) -> AppResult<Vec<AuditRecord>>;
}

/// Scheduled-event and notice persistence.
#[async_trait]
pub trait NoticeStore: Send + Sync {
    /// Insert a parent scheduled event.
    async fn insert_event(&self, event: &ProjectEvent) -> AppResult<()>;

    /// Soft-delete a scheduled event; its notices stop aggregating.
    async fn soft_delete_event(&self, event_id: Uuid) -> AppResult<()>;

    /// Insert a batch of per-recipient notices.
    async fn insert_notices(&self, notices: &[EventNotice]) -> AppResult<()>;

    /// Unacknowledged notices for a recipient, excluding notices whose
    /// parent event is soft-deleted, newest first.
    async fn unread_notices(
        &self,
        recipient: &str,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<EventNotice>>;

    /// Mark a notice read. Idempotent: returns `true` if the flag
    /// flipped, `false` if it was already read or absent.
    async fn mark_event_read(
        &self,
        event_id: Uuid,
        recipient: &str,
        project_id: Uuid,
    ) -> AppResult<bool>;
}

/// Chat message and mention persistence.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a chat message.
    async fn insert_message(&self, message: &ChatMessage) -> AppResult<()>;

    /// Insert the mention rows derived from a message.
    async fn insert_mentions(&self, mentions: &[ChatMention]) -> AppResult<()>;

    /// Unacknowledged mentions of a user, newest first.
    async fn unread_mentions(
        &self,
        username: &str,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<ChatMention>>;

    /// Look up a single mention row.
    async fn find_mention(&self, mention_id: Uuid) -> AppResult<Option<ChatMention>>;

    /// Mark a mention read. Idempotent: returns `true` if the flag
    /// flipped, `false` otherwise.
    async fn mark_mention_read(&self, mention_id: Uuid) -> AppResult<bool>;
}

/// Roster lookup, used only to derive completion thresholds and the
/// global-dashboard project set.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Usernames of all members of a project.
    async fn project_members(&self, project_id: Uuid) -> AppResult<Vec<String>>;

    /// Projects a user belongs to.
    async fn projects_for(&self, username: &str) -> AppResult<Vec<Uuid>>;
}

/// Project creation (roster seeding).
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a project together with its member roster.
    async fn insert_project(&self, project: &Project, members: &[String]) -> AppResult<()>;
}
