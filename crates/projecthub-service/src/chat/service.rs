//! Chat message posting.
//!
//! Posting a message parses `@username` tokens against the project roster
//! and inserts one unread mention row per mentioned member. The client
//! idempotency key travels with the message and is echoed through the
//! change feed, so the sender's session can replace its optimistic
//! placeholder with the server copy by exact key match.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use projecthub_core::error::AppError;
use projecthub_core::events::ChangeEvent;
use projecthub_core::feed::ChangeFeedPublisher;
use projecthub_core::result::AppResult;
use projecthub_database::store::{ChatStore, RosterProvider};
use projecthub_entity::chat::ChatMessage;
use projecthub_entity::notification::ChatMention;

/// Posts chat messages and fans mention rows out to recipients.
pub struct ChatService {
    chat: Arc<dyn ChatStore>,
    roster: Arc<dyn RosterProvider>,
    feed: Arc<dyn ChangeFeedPublisher>,
}

impl ChatService {
    /// Create a new chat service.
    pub fn new(
        chat: Arc<dyn ChatStore>,
        roster: Arc<dyn RosterProvider>,
        feed: Arc<dyn ChangeFeedPublisher>,
    ) -> Self {
        Self { chat, roster, feed }
    }

    /// Post a message and record mentions of roster members.
    pub async fn post_message(
        &self,
        project_id: Uuid,
        author: &str,
        text: &str,
        client_key: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> AppResult<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Chat message must not be empty"));
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            project_id,
            username: author.to_string(),
            message: text.to_string(),
            client_key,
            created_at: at,
        };
        self.chat.insert_message(&message).await?;

        let members = self.roster.project_members(project_id).await?;
        let mentions: Vec<ChatMention> = extract_mentions(text, &members, author)
            .into_iter()
            .map(|mentioned_user| ChatMention {
                id: Uuid::new_v4(),
                project_id,
                message_id: message.id,
                mentioned_by: author.to_string(),
                mentioned_user,
                message: message.message.clone(),
                created_at: at,
                read: false,
            })
            .collect();
        self.chat.insert_mentions(&mentions).await?;

        self.feed.publish(ChangeEvent::MessagePosted {
            message_id: message.id,
            project_id,
            username: message.username.clone(),
            message: message.message.clone(),
            client_key,
            created_at: at,
        });
        for mention in &mentions {
            self.feed.publish(ChangeEvent::MentionCreated {
                mention_id: mention.id,
                project_id,
                message_id: message.id,
                mentioned_by: mention.mentioned_by.clone(),
                mentioned_user: mention.mentioned_user.clone(),
                message: mention.message.clone(),
                client_key,
                created_at: at,
            });
        }

        Ok(message)
    }
}

/// `@username` tokens that name a roster member other than the author,
/// first occurrence order, de-duplicated.
pub fn extract_mentions(text: &str, roster: &[String], author: &str) -> Vec<String> {
    let mut mentioned = Vec::new();
    for token in text.split_whitespace() {
        let Some(stripped) = token.strip_prefix('@') else {
            continue;
        };
        let name = stripped.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_');
        if name.is_empty() || name == author {
            continue;
        }
        if roster.iter().any(|m| m == name) && !mentioned.iter().any(|m| m == name) {
            mentioned.push(name.to_string());
        }
    }
    mentioned
}

#[cfg(test)]
mod tests {
    use super::*;
    use projecthub_database::memory::MemoryStore;
    use projecthub_database::store::ProjectStore;
    use projecthub_entity::project::Project;

    struct NullFeed;

    impl ChangeFeedPublisher for NullFeed {
        fn publish(&self, _event: ChangeEvent) {}
    }

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_extract_mentions_matches_roster_only() {
        let roster = roster(&["a", "b", "c"]);
        assert_eq!(
            extract_mentions("@b @stranger please check @c.", &roster, "a"),
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_extract_mentions_skips_author_and_duplicates() {
        let roster = roster(&["a", "b"]);
        assert_eq!(
            extract_mentions("@a @b @b", &roster, "a"),
            vec!["b".to_string()]
        );
    }

    #[test]
    fn test_extract_mentions_ignores_plain_text() {
        let roster = roster(&["a", "b"]);
        assert!(extract_mentions("no mentions here", &roster, "a").is_empty());
    }

    #[tokio::test]
    async fn test_post_message_records_mentions() {
        let store = Arc::new(MemoryStore::new());
        let project = Project {
            id: Uuid::new_v4(),
            name: "bridge".to_string(),
            created_by: "a".to_string(),
            created_at: Utc::now(),
        };
        store
            .insert_project(&project, &roster(&["a", "b", "c"]))
            .await
            .unwrap();

        let service = ChatService::new(store.clone(), store.clone(), Arc::new(NullFeed));
        service
            .post_message(project.id, "a", "@b the plans are up", None, Utc::now())
            .await
            .unwrap();

        let mentions = store.unread_mentions("b", Some(project.id)).await.unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].mentioned_by, "a");
        assert!(store.unread_mentions("c", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = ChatService::new(store.clone(), store, Arc::new(NullFeed));
        let result = service
            .post_message(Uuid::new_v4(), "a", "   ", None, Utc::now())
            .await;
        assert!(result.is_err());
    }
}
