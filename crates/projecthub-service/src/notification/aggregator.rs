//! Merges uploads, event notices, and chat mentions into one per-viewer
//! feed.
//!
//! Upload unread state is derived from audit membership on every call;
//! notice/mention unread state is a persisted flag. Acknowledgements go
//! through an optimistic overlay: the item disappears from the next
//! aggregation immediately, and the overlay entry is dropped once a full
//! refresh confirms the store caught up. Consumers receive this
//! aggregator as an injected handle; acknowledgement methods live here,
//! not on any global.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use projecthub_core::events::ChangeEvent;
use projecthub_core::feed::ChangeFeedPublisher;
use projecthub_core::result::AppResult;
use projecthub_core::types::ViewerScope;
use projecthub_database::store::{AuditStore, ChatStore, NoticeStore, RosterProvider};
use projecthub_entity::audit::AuditAction;
use projecthub_entity::notification::{FileUploadNotice, NotificationFeed};

use crate::readstate;

/// Overlay key for an optimistically acknowledged event notice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EventAck {
    event_id: Uuid,
    recipient: String,
    project_id: Uuid,
}

/// Aggregates the three notification sources for a viewer scope.
pub struct NotificationAggregator {
    audit: Arc<dyn AuditStore>,
    notices: Arc<dyn NoticeStore>,
    chat: Arc<dyn ChatStore>,
    roster: Arc<dyn RosterProvider>,
    feed: Arc<dyn ChangeFeedPublisher>,
    acked_events: Mutex<HashSet<EventAck>>,
    acked_mentions: Mutex<HashSet<(Uuid, String)>>,
}

impl NotificationAggregator {
    /// Create a new aggregator over the given stores.
    pub fn new(
        audit: Arc<dyn AuditStore>,
        notices: Arc<dyn NoticeStore>,
        chat: Arc<dyn ChatStore>,
        roster: Arc<dyn RosterProvider>,
        feed: Arc<dyn ChangeFeedPublisher>,
    ) -> Self {
        Self {
            audit,
            notices,
            chat,
            roster,
            feed,
            acked_events: Mutex::new(HashSet::new()),
            acked_mentions: Mutex::new(HashSet::new()),
        }
    }

    /// Build the grouped feed for a viewer scope.
    ///
    /// Re-running with no intervening writes yields identical output.
    pub async fn aggregate(&self, scope: &ViewerScope) -> AppResult<NotificationFeed> {
        let project_ids = match scope.project_id {
            Some(project_id) => vec![project_id],
            None => self.roster.projects_for(&scope.username).await?,
        };

        let mut feed = NotificationFeed::default();
        for project_id in &project_ids {
            let records = self.audit.query_project_actions(*project_id, None).await?;
            let deleted: HashSet<&str> = records
                .iter()
                .filter(|r| r.action == AuditAction::Delete)
                .filter_map(|r| r.subject_name.as_deref())
                .collect();

            for record in readstate::unread_uploads(&records, &scope.username) {
                let (Some(file_name), Some(folder)) =
                    (record.subject_name.as_deref(), record.folder.as_deref())
                else {
                    continue;
                };
                // Soft-deleted files never resurrect as notifications.
                if deleted.contains(file_name) {
                    continue;
                }
                let notice = FileUploadNotice {
                    project_id: *project_id,
                    folder: folder.to_string(),
                    file_name: file_name.to_string(),
                    uploaded_by: record.actor.clone(),
                    uploaded_at: record.acted_at,
                };
                // Records arrive newest first; the first occurrence per
                // file name wins the identity key.
                if !feed
                    .uploads
                    .iter()
                    .any(|n| n.project_id == *project_id && n.file_name == file_name)
                {
                    feed.uploads.push(notice);
                }
            }
        }

        let event_notices = self
            .notices
            .unread_notices(&scope.username, scope.project_id)
            .await?;
        let acked_events = {
            let mut acked = self.acked_events.lock().unwrap_or_else(|e| e.into_inner());
            // Drop overlay entries the store has confirmed; keep pending
            // ones and entries outside this scope untouched.
            acked.retain(|key| {
                let in_scope = key.recipient == scope.username
                    && scope.project_id.is_none_or(|p| key.project_id == p);
                if !in_scope {
                    return true;
                }
                event_notices
                    .iter()
                    .any(|n| n.event_id == key.event_id && n.project_id == key.project_id)
            });
            acked.clone()
        };
        feed.events = event_notices
            .into_iter()
            .filter(|n| {
                !acked_events.contains(&EventAck {
                    event_id: n.event_id,
                    recipient: n.recipient.clone(),
                    project_id: n.project_id,
                })
            })
            .collect();

        let mentions = self
            .chat
            .unread_mentions(&scope.username, scope.project_id)
            .await?;
        let acked_mentions = {
            let mut acked = self.acked_mentions.lock().unwrap_or_else(|e| e.into_inner());
            // Same confirmation rule, scoped to this viewer's entries.
            acked.retain(|(id, viewer)| {
                viewer != &scope.username || mentions.iter().any(|m| m.id == *id)
            });
            acked.clone()
        };
        feed.mentions = mentions
            .into_iter()
            .filter(|m| !acked_mentions.contains(&(m.id, scope.username.clone())))
            .collect();

        feed.sort();
        Ok(feed)
    }

    /// Combined unread tally for a viewer scope, evaluated at `now`.
    pub async fn unread_count(&self, scope: &ViewerScope, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.aggregate(scope).await?.unread_count(now))
    }

    /// Acknowledge an event notice.
    ///
    /// Idempotent, and effective for the next aggregation immediately.
    /// The store write is best-effort and reconciled on the next full
    /// refresh if it fails transiently.
    pub async fn mark_event_read(
        &self,
        event_id: Uuid,
        viewer: &str,
        project_id: Uuid,
    ) -> AppResult<()> {
        self.acked_events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(EventAck {
                event_id,
                recipient: viewer.to_string(),
                project_id,
            });

        match self
            .notices
            .mark_event_read(event_id, viewer, project_id)
            .await
        {
            Ok(_) => {
                self.feed.publish(ChangeEvent::NoticeRead {
                    project_id,
                    event_id,
                    recipient: viewer.to_string(),
                });
                Ok(())
            }
            Err(e) if e.is_transient() => {
                warn!(%event_id, error = %e, "Notice acknowledgement deferred; overlay holds");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Acknowledge a chat mention. Same semantics as [`Self::mark_event_read`].
    pub async fn mark_mention_read(&self, mention_id: Uuid, viewer: &str) -> AppResult<()> {
        self.acked_mentions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((mention_id, viewer.to_string()));

        match self.chat.mark_mention_read(mention_id).await {
            Ok(changed) => {
                if changed {
                    if let Some(mention) = self.chat.find_mention(mention_id).await? {
                        self.feed.publish(ChangeEvent::MentionRead {
                            project_id: mention.project_id,
                            mention_id,
                            mentioned_user: viewer.to_string(),
                        });
                    }
                }
                Ok(())
            }
            Err(e) if e.is_transient() => {
                warn!(%mention_id, error = %e, "Mention acknowledgement deferred; overlay holds");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projecthub_database::memory::MemoryStore;
    use projecthub_entity::audit::{NewAuditAction, Subject};
    use projecthub_entity::chat::ChatMessage;
    use projecthub_entity::event::ProjectEvent;
    use projecthub_entity::notification::{ChatMention, EventNotice};
    use projecthub_entity::project::Project;
    use projecthub_database::store::ProjectStore;

    struct NullFeed;

    impl ChangeFeedPublisher for NullFeed {
        fn publish(&self, _event: ChangeEvent) {}
    }

    fn aggregator_over(store: Arc<MemoryStore>) -> NotificationAggregator {
        NotificationAggregator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            Arc::new(NullFeed),
        )
    }

    async fn seed_project(store: &MemoryStore, members: &[&str]) -> Uuid {
        let project = Project {
            id: Uuid::new_v4(),
            name: "bridge".to_string(),
            created_by: members[0].to_string(),
            created_at: Utc::now(),
        };
        let members: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        store.insert_project(&project, &members).await.unwrap();
        project.id
    }

    async fn seed_upload(store: &MemoryStore, project_id: Uuid, file_name: &str, actor: &str) {
        store
            .insert_action(&NewAuditAction {
                project_id,
                folder: Some("drawings".to_string()),
                subject_name: Some(file_name.to_string()),
                action: AuditAction::Upload,
                actor: actor.to_string(),
                acted_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    async fn seed_notice(store: &MemoryStore, project_id: Uuid, recipient: &str) -> EventNotice {
        let event = ProjectEvent {
            id: Uuid::new_v4(),
            project_id,
            topic: "site visit".to_string(),
            event_date: None,
            created_by: "a".to_string(),
            created_at: Utc::now(),
            deleted: false,
        };
        store.insert_event(&event).await.unwrap();
        let notice = EventNotice {
            id: Uuid::new_v4(),
            project_id,
            event_id: event.id,
            topic: event.topic.clone(),
            created_by: event.created_by.clone(),
            recipient: recipient.to_string(),
            event_date: None,
            created_at: Utc::now(),
            read: false,
        };
        store.insert_notices(std::slice::from_ref(&notice)).await.unwrap();
        notice
    }

    #[tokio::test]
    async fn test_aggregation_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let project_id = seed_project(&store, &["a", "b"]).await;
        seed_upload(&store, project_id, "report.pdf", "a").await;
        seed_notice(&store, project_id, "b").await;

        let aggregator = aggregator_over(store);
        let scope = ViewerScope::project("b", project_id);
        let first = aggregator.aggregate(&scope).await.unwrap();
        let second = aggregator.aggregate(&scope).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.uploads.len(), 1);
        assert_eq!(first.events.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_file_never_resurrects() {
        let store = Arc::new(MemoryStore::new());
        let project_id = seed_project(&store, &["a", "b"]).await;
        seed_upload(&store, project_id, "report.pdf", "a").await;
        store
            .insert_action(&NewAuditAction {
                project_id,
                folder: Some("drawings".to_string()),
                subject_name: Some("report.pdf".to_string()),
                action: AuditAction::Delete,
                actor: "a".to_string(),
                acted_at: Utc::now(),
            })
            .await
            .unwrap();

        let aggregator = aggregator_over(store);
        let feed = aggregator
            .aggregate(&ViewerScope::project("b", project_id))
            .await
            .unwrap();
        assert!(feed.uploads.is_empty());
    }

    #[tokio::test]
    async fn test_uploader_sees_no_own_upload() {
        let store = Arc::new(MemoryStore::new());
        let project_id = seed_project(&store, &["a", "b"]).await;
        seed_upload(&store, project_id, "report.pdf", "a").await;

        let aggregator = aggregator_over(store);
        let feed = aggregator
            .aggregate(&ViewerScope::project("a", project_id))
            .await
            .unwrap();
        assert!(feed.uploads.is_empty());
    }

    #[tokio::test]
    async fn test_mark_event_read_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let project_id = seed_project(&store, &["a", "b"]).await;
        let notice = seed_notice(&store, project_id, "b").await;

        let aggregator = aggregator_over(store);
        let scope = ViewerScope::project("b", project_id);
        let now = Utc::now();
        assert_eq!(aggregator.unread_count(&scope, now).await.unwrap(), 1);

        aggregator
            .mark_event_read(notice.event_id, "b", project_id)
            .await
            .unwrap();
        assert_eq!(aggregator.unread_count(&scope, now).await.unwrap(), 0);

        // Second acknowledgement: no error, no double-decrement.
        aggregator
            .mark_event_read(notice.event_id, "b", project_id)
            .await
            .unwrap();
        assert_eq!(aggregator.unread_count(&scope, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_mention_read_removes_from_feed() {
        let store = Arc::new(MemoryStore::new());
        let project_id = seed_project(&store, &["a", "b"]).await;
        let message = ChatMessage {
            id: Uuid::new_v4(),
            project_id,
            username: "a".to_string(),
            message: "@b please review".to_string(),
            client_key: None,
            created_at: Utc::now(),
        };
        store.insert_message(&message).await.unwrap();
        let mention = ChatMention {
            id: Uuid::new_v4(),
            project_id,
            message_id: message.id,
            mentioned_by: "a".to_string(),
            mentioned_user: "b".to_string(),
            message: message.message.clone(),
            created_at: Utc::now(),
            read: false,
        };
        store.insert_mentions(std::slice::from_ref(&mention)).await.unwrap();

        let aggregator = aggregator_over(store);
        let scope = ViewerScope::project("b", project_id);
        assert_eq!(aggregator.aggregate(&scope).await.unwrap().mentions.len(), 1);

        aggregator.mark_mention_read(mention.id, "b").await.unwrap();
        assert!(aggregator.aggregate(&scope).await.unwrap().mentions.is_empty());
        aggregator.mark_mention_read(mention.id, "b").await.unwrap();
    }

    #[tokio::test]
    async fn test_global_scope_spans_projects() {
        let store = Arc::new(MemoryStore::new());
        let p1 = seed_project(&store, &["a", "b"]).await;
        let p2 = seed_project(&store, &["a", "b", "c"]).await;
        seed_upload(&store, p1, "report.pdf", "a").await;
        seed_upload(&store, p2, "plan.pdf", "c").await;

        let aggregator = aggregator_over(store);
        let feed = aggregator.aggregate(&ViewerScope::global("b")).await.unwrap();
        assert_eq!(feed.uploads.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_upload_records_share_one_key() {
        let store = Arc::new(MemoryStore::new());
        let project_id = seed_project(&store, &["a", "b"]).await;
        seed_upload(&store, project_id, "report.pdf", "a").await;
        seed_upload(&store, project_id, "report.pdf", "a").await;

        let aggregator = aggregator_over(store);
        let feed = aggregator
            .aggregate(&ViewerScope::project("b", project_id))
            .await
            .unwrap();
        assert_eq!(feed.uploads.len(), 1);
    }
}
