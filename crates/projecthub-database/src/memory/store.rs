//! In-memory implementation of the store contracts.
//!
//! A single `RwLock` serializes mutations, which makes find-or-create and
//! add-member-if-absent atomic for free, the same guarantees the
//! PostgreSQL backend gets from its uniqueness constraints. Concurrent
//! writers therefore never lose a membership update on either backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use projecthub_core::error::AppError;
use projecthub_core::result::AppResult;
use projecthub_entity::audit::{Acknowledgement, AuditAction, AuditRecord, NewAuditAction, Subject};
use projecthub_entity::chat::ChatMessage;
use projecthub_entity::event::ProjectEvent;
use projecthub_entity::notification::{ChatMention, EventNotice};
use projecthub_entity::project::Project;

use crate::store::{AuditStore, ChatStore, NoticeStore, ProjectStore, RosterProvider};

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<Uuid, AuditRecord>,
    events: HashMap<Uuid, ProjectEvent>,
    notices: Vec<EventNotice>,
    messages: Vec<ChatMessage>,
    mentions: Vec<ChatMention>,
    projects: HashMap<Uuid, Project>,
    members: HashMap<Uuid, Vec<String>>,
}

/// In-memory store implementing every store contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert_action(&self, action: &NewAuditAction) -> AppResult<AuditRecord> {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            project_id: action.project_id,
            folder: action.folder.clone(),
            subject_name: action.subject_name.clone(),
            action: action.action,
            actor: action.actor.clone(),
            acted_at: action.acted_at,
            viewed_by: Vec::new(),
            downloaded_by: Vec::new(),
        };
        let mut state = self.state.write().await;
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn upsert_membership_record(
        &self,
        subject: &Subject,
        action: AuditAction,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AppResult<AuditRecord> {
        if !action.is_membership() {
            return Err(AppError::validation(format!(
                "Action {action:?} does not accumulate a membership set"
            )));
        }

        let mut state = self.state.write().await;
        if let Some(existing) = state.records.values().find(|r| {
            r.action == action
                && r.project_id == subject.project_id
                && r.folder.as_deref() == Some(subject.folder.as_str())
                && r.subject_name.as_deref() == Some(subject.file_name.as_str())
        }) {
            return Ok(existing.clone());
        }

        let record = AuditRecord {
            id: Uuid::new_v4(),
            project_id: subject.project_id,
            folder: Some(subject.folder.clone()),
            subject_name: Some(subject.file_name.clone()),
            action,
            actor: actor.to_string(),
            acted_at: at,
            viewed_by: Vec::new(),
            downloaded_by: Vec::new(),
        };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn add_member(
        &self,
        record_id: Uuid,
        username: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .get_mut(&record_id)
            .ok_or_else(|| AppError::not_found(format!("Audit record {record_id} not found")))?;

        let members = match record.action {
            AuditAction::Preview => &mut record.viewed_by,
            AuditAction::Download => &mut record.downloaded_by,
            _ => {
                return Err(AppError::validation(
                    "Record does not accumulate a membership set",
                ));
            }
        };

        if members.iter().any(|m| m.username == username) {
            return Ok(false);
        }
        members.push(Acknowledgement {
            username: username.to_string(),
            acked_at: at,
        });
        Ok(true)
    }

    async fn find_uploader(&self, subject: &Subject) -> AppResult<Option<String>> {
        let state = self.state.read().await;
        let uploader = state
            .records
            .values()
            .filter(|r| {
                r.action == AuditAction::Upload
                    && r.project_id == subject.project_id
                    && r.folder.as_deref() == Some(subject.folder.as_str())
                    && r.subject_name.as_deref() == Some(subject.file_name.as_str())
            })
            .min_by_key(|r| r.acted_at)
            .map(|r| r.actor.clone());
        Ok(uploader)
    }

    async fn query_project_actions(
        &self,
        project_id: Uuid,
        folder: Option<&str>,
    ) -> AppResult<Vec<AuditRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<AuditRecord> = state
            .records
            .values()
            .filter(|r| r.project_id == project_id)
            .filter(|r| folder.is_none_or(|f| r.folder.as_deref() == Some(f)))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.acted_at.cmp(&a.acted_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }
}

#[async_trait]
impl NoticeStore for MemoryStore {
    async fn insert_event(&self, event: &ProjectEvent) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn soft_delete_event(&self, event_id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(event) = state.events.get_mut(&event_id) {
            event.deleted = true;
        }
        Ok(())
    }

    async fn insert_notices(&self, notices: &[EventNotice]) -> AppResult<()> {
        let mut state = self.state.write().await;
        for notice in notices {
            let duplicate = state
                .notices
                .iter()
                .any(|n| n.event_id == notice.event_id && n.recipient == notice.recipient);
            if !duplicate {
                state.notices.push(notice.clone());
            }
        }
        Ok(())
    }

    async fn unread_notices(
        &self,
        recipient: &str,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<EventNotice>> {
        let state = self.state.read().await;
        let mut notices: Vec<EventNotice> = state
            .notices
            .iter()
            .filter(|n| n.recipient == recipient && !n.read)
            .filter(|n| project_id.is_none_or(|p| n.project_id == p))
            .filter(|n| {
                state
                    .events
                    .get(&n.event_id)
                    .map(|e| !e.deleted)
                    .unwrap_or(false)
            })
            .cloned()
            .map(|mut n| {
                n.event_date = state.events.get(&n.event_id).and_then(|e| e.event_date);
                n
            })
            .collect();
        notices.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(notices)
    }

    async fn mark_event_read(
        &self,
        event_id: Uuid,
        recipient: &str,
        project_id: Uuid,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let mut changed = false;
        for notice in state.notices.iter_mut() {
            if notice.event_id == event_id
                && notice.recipient == recipient
                && notice.project_id == project_id
                && !notice.read
            {
                notice.read = true;
                changed = true;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert_message(&self, message: &ChatMessage) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.messages.push(message.clone());
        Ok(())
    }

    async fn insert_mentions(&self, mentions: &[ChatMention]) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.mentions.extend(mentions.iter().cloned());
        Ok(())
    }

    async fn unread_mentions(
        &self,
        username: &str,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<ChatMention>> {
        let state = self.state.read().await;
        let mut mentions: Vec<ChatMention> = state
            .mentions
            .iter()
            .filter(|m| m.mentioned_user == username && !m.read)
            .filter(|m| project_id.is_none_or(|p| m.project_id == p))
            .cloned()
            .collect();
        mentions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(mentions)
    }

    async fn find_mention(&self, mention_id: Uuid) -> AppResult<Option<ChatMention>> {
        let state = self.state.read().await;
        Ok(state.mentions.iter().find(|m| m.id == mention_id).cloned())
    }

    async fn mark_mention_read(&self, mention_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        for mention in state.mentions.iter_mut() {
            if mention.id == mention_id {
                if mention.read {
                    return Ok(false);
                }
                mention.read = true;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl RosterProvider for MemoryStore {
    async fn project_members(&self, project_id: Uuid) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        let mut members = state.members.get(&project_id).cloned().unwrap_or_default();
        members.sort();
        Ok(members)
    }

    async fn projects_for(&self, username: &str) -> AppResult<Vec<Uuid>> {
        let state = self.state.read().await;
        let mut projects: Vec<Uuid> = state
            .members
            .iter()
            .filter(|(_, members)| members.iter().any(|m| m == username))
            .map(|(project_id, _)| *project_id)
            .collect();
        projects.sort();
        Ok(projects)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: &Project, members: &[String]) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.projects.insert(project.id, project.clone());
        let roster = state.members.entry(project.id).or_default();
        for username in members {
            if !roster.iter().any(|m| m == username) {
                roster.push(username.clone());
            }
        }
        Ok(())
    }
}
