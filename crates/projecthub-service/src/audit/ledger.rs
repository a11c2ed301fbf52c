//! Exactly-once-per-user action recording.
//!
//! Preview/download observations accumulate into the single membership
//! record for their (subject, action); everything else appends an
//! immutable record. Duplicates and uploader self-actions are absorbed
//! silently; the only caller-visible failure mode is a transient store
//! error, in which case the action must not be displayed as recorded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use projecthub_core::error::ErrorKind;
use projecthub_core::events::{ChangeEvent, MembershipAction};
use projecthub_core::feed::ChangeFeedPublisher;
use projecthub_core::result::AppResult;
use projecthub_database::store::AuditStore;
use projecthub_entity::audit::{AuditAction, AuditRecord, NewAuditAction, Subject};

/// Result of recording a membership action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The actor was appended to the membership set.
    Updated,
    /// The actor was already present (or is the uploader); nothing was
    /// written.
    AlreadyRecorded,
}

/// Re-reads after losing a record-creation race are bounded; the race can
/// only be lost once per subject since the winner's row persists.
const MAX_CONFLICT_RETRIES: usize = 3;

/// Records user actions against file subjects.
pub struct AuditLedger {
    store: Arc<dyn AuditStore>,
    feed: Arc<dyn ChangeFeedPublisher>,
}

impl AuditLedger {
    /// Create a new audit ledger.
    pub fn new(store: Arc<dyn AuditStore>, feed: Arc<dyn ChangeFeedPublisher>) -> Self {
        Self { store, feed }
    }

    /// Record that `actor` previewed the subject.
    pub async fn record_preview(
        &self,
        subject: &Subject,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<RecordOutcome> {
        self.record_membership(subject, MembershipAction::Preview, actor, at)
            .await
    }

    /// Record that `actor` downloaded the subject.
    pub async fn record_download(
        &self,
        subject: &Subject,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<RecordOutcome> {
        self.record_membership(subject, MembershipAction::Download, actor, at)
            .await
    }

    async fn record_membership(
        &self,
        subject: &Subject,
        action: MembershipAction,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<RecordOutcome> {
        // The uploader is excluded from completion accounting entirely.
        if let Some(uploader) = self.store.find_uploader(subject).await? {
            if uploader == actor {
                return Ok(RecordOutcome::AlreadyRecorded);
            }
        }

        let mut attempt = 0;
        let record = loop {
            match self
                .store
                .upsert_membership_record(subject, AuditAction::from(action), actor, at)
                .await
            {
                Ok(record) => break record,
                Err(e) if e.kind == ErrorKind::Conflict && attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    debug!(
                        file_name = %subject.file_name,
                        attempt,
                        "Lost membership record creation race; re-reading"
                    );
                }
                Err(e) => return Err(e),
            }
        };

        // Atomic insert-or-ignore: concurrent duplicates collapse here.
        let inserted = self.store.add_member(record.id, actor, at).await?;
        if !inserted {
            return Ok(RecordOutcome::AlreadyRecorded);
        }

        self.feed.publish(ChangeEvent::MembershipAdded {
            project_id: subject.project_id,
            folder: subject.folder.clone(),
            file_name: subject.file_name.clone(),
            action,
            username: actor.to_string(),
            acked_at: at,
        });
        Ok(RecordOutcome::Updated)
    }

    /// Record a file upload. Each upload is its own immutable record.
    pub async fn record_upload(
        &self,
        subject: &Subject,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<AuditRecord> {
        let record = self
            .store
            .insert_action(&NewAuditAction {
                project_id: subject.project_id,
                folder: Some(subject.folder.clone()),
                subject_name: Some(subject.file_name.clone()),
                action: AuditAction::Upload,
                actor: actor.to_string(),
                acted_at: at,
            })
            .await?;

        self.feed.publish(ChangeEvent::FileUploaded {
            project_id: subject.project_id,
            folder: subject.folder.clone(),
            file_name: subject.file_name.clone(),
            uploaded_by: actor.to_string(),
            uploaded_at: at,
        });
        Ok(record)
    }

    /// Record a file deletion.
    pub async fn record_delete(
        &self,
        subject: &Subject,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<AuditRecord> {
        let record = self
            .store
            .insert_action(&NewAuditAction {
                project_id: subject.project_id,
                folder: Some(subject.folder.clone()),
                subject_name: Some(subject.file_name.clone()),
                action: AuditAction::Delete,
                actor: actor.to_string(),
                acted_at: at,
            })
            .await?;

        self.feed.publish(ChangeEvent::FileDeleted {
            project_id: subject.project_id,
            folder: subject.folder.clone(),
            file_name: subject.file_name.clone(),
            deleted_by: actor.to_string(),
            deleted_at: at,
        });
        Ok(record)
    }

    /// Record a folder lifecycle action.
    pub async fn record_folder(
        &self,
        project_id: Uuid,
        folder: &str,
        created: bool,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<AuditRecord> {
        let action = if created {
            AuditAction::FolderCreated
        } else {
            AuditAction::FolderDeleted
        };
        self.store
            .insert_action(&NewAuditAction {
                project_id,
                folder: Some(folder.to_string()),
                subject_name: None,
                action,
                actor: actor.to_string(),
                acted_at: at,
            })
            .await
    }

    /// Record removal of an external link.
    pub async fn record_link_deleted(
        &self,
        project_id: Uuid,
        folder: Option<&str>,
        link_name: &str,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<AuditRecord> {
        self.store
            .insert_action(&NewAuditAction {
                project_id,
                folder: folder.map(str::to_string),
                subject_name: Some(link_name.to_string()),
                action: AuditAction::LinkDeleted,
                actor: actor.to_string(),
                acted_at: at,
            })
            .await
    }

    /// Record project creation.
    pub async fn record_project_created(
        &self,
        project_id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<AuditRecord> {
        self.store
            .insert_action(&NewAuditAction {
                project_id,
                folder: None,
                subject_name: None,
                action: AuditAction::ProjectCreated,
                actor: actor.to_string(),
                acted_at: at,
            })
            .await
    }

    /// Project activity log, newest first, membership sets populated.
    pub async fn project_log(
        &self,
        project_id: Uuid,
        folder: Option<&str>,
    ) -> AppResult<Vec<AuditRecord>> {
        self.store.query_project_actions(project_id, folder).await
    }
}
