//! Audit record entity model.
//!
//! One row per (subject, action-kind) tuple. `preview`/`download` records
//! accumulate a per-user membership set; every other action is an
//! append-only immutable record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use projecthub_core::events::MembershipAction;

/// The action recorded by an audit record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "audit_action", rename_all = "snake_case")]
pub enum AuditAction {
    /// A file was uploaded.
    Upload,
    /// A file was previewed. Membership action.
    Preview,
    /// A file was downloaded. Membership action.
    Download,
    /// A file was deleted.
    Delete,
    /// A folder was created.
    FolderCreated,
    /// A folder was deleted.
    FolderDeleted,
    /// An external link was removed.
    LinkDeleted,
    /// The project itself was created.
    ProjectCreated,
}

impl AuditAction {
    /// Whether this action accumulates a per-user membership set rather
    /// than appending a new immutable record per occurrence.
    pub fn is_membership(&self) -> bool {
        matches!(self, Self::Preview | Self::Download)
    }
}

impl From<MembershipAction> for AuditAction {
    fn from(action: MembershipAction) -> Self {
        match action {
            MembershipAction::Preview => Self::Preview,
            MembershipAction::Download => Self::Download,
        }
    }
}

/// A file subject a membership action is recorded against.
///
/// Recording is keyed by the full (project, folder, file name) triple;
/// read-state lookups later fold folders together by file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    /// The owning project.
    pub project_id: Uuid,
    /// The folder containing the file.
    pub folder: String,
    /// The file name.
    pub file_name: String,
}

impl Subject {
    /// Create a new subject reference.
    pub fn new(project_id: Uuid, folder: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            project_id,
            folder: folder.into(),
            file_name: file_name.into(),
        }
    }
}

/// A single membership entry: who acted, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Acknowledgement {
    /// The user who performed the action.
    pub username: String,
    /// When they performed it.
    pub acked_at: DateTime<Utc>,
}

/// An audit record for one (subject, action) tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// The owning project.
    pub project_id: Uuid,
    /// Folder, if the action is folder- or file-scoped.
    pub folder: Option<String>,
    /// File name, if the action is file-scoped.
    pub subject_name: Option<String>,
    /// The recorded action.
    pub action: AuditAction,
    /// The user who triggered creation of the record.
    pub actor: String,
    /// When the record was created.
    pub acted_at: DateTime<Utc>,
    /// Users who previewed the subject. Populated for `preview` records.
    #[sqlx(skip)]
    pub viewed_by: Vec<Acknowledgement>,
    /// Users who downloaded the subject. Populated for `download` records.
    #[sqlx(skip)]
    pub downloaded_by: Vec<Acknowledgement>,
}

impl AuditRecord {
    /// The membership set this record accumulates, if it is a
    /// membership record.
    pub fn members(&self) -> &[Acknowledgement] {
        match self.action {
            AuditAction::Preview => &self.viewed_by,
            AuditAction::Download => &self.downloaded_by,
            _ => &[],
        }
    }

    /// Whether the given user already appears in the membership set.
    pub fn has_member(&self, username: &str) -> bool {
        self.members().iter().any(|m| m.username == username)
    }
}

/// Data required to insert a new audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditAction {
    /// The owning project.
    pub project_id: Uuid,
    /// Folder, if folder- or file-scoped.
    pub folder: Option<String>,
    /// File name, if file-scoped.
    pub subject_name: Option<String>,
    /// The action performed.
    pub action: AuditAction,
    /// The acting user.
    pub actor: String,
    /// When the action occurred.
    pub acted_at: DateTime<Utc>,
}
