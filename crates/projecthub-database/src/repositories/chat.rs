//! Chat message and mention repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use projecthub_core::result::AppResult;
use projecthub_entity::chat::ChatMessage;
use projecthub_entity::notification::ChatMention;

use crate::repositories::db_error;
use crate::store::ChatStore;

/// Repository for chat messages and mention rows.
#[derive(Debug, Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    /// Create a new chat repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for ChatRepository {
    async fn insert_message(&self, message: &ChatMessage) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, project_id, username, message, client_key, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id)
        .bind(message.project_id)
        .bind(&message.username)
        .bind(&message.message)
        .bind(message.client_key)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert chat message", e))?;
        Ok(())
    }

    async fn insert_mentions(&self, mentions: &[ChatMention]) -> AppResult<()> {
        for mention in mentions {
            sqlx::query(
                "INSERT INTO chat_mentions (id, project_id, message_id, mentioned_by, mentioned_user, message, created_at, read) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(mention.id)
            .bind(mention.project_id)
            .bind(mention.message_id)
            .bind(&mention.mentioned_by)
            .bind(&mention.mentioned_user)
            .bind(&mention.message)
            .bind(mention.created_at)
            .bind(mention.read)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to insert chat mention", e))?;
        }
        Ok(())
    }

    async fn unread_mentions(
        &self,
        username: &str,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<ChatMention>> {
        match project_id {
            Some(project_id) => sqlx::query_as::<_, ChatMention>(
                "SELECT * FROM chat_mentions \
                 WHERE mentioned_user = $1 AND read = FALSE AND project_id = $2 \
                 ORDER BY created_at DESC",
            )
            .bind(username)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as::<_, ChatMention>(
                "SELECT * FROM chat_mentions \
                 WHERE mentioned_user = $1 AND read = FALSE ORDER BY created_at DESC",
            )
            .bind(username)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| db_error("Failed to list unread mentions", e))
    }

    async fn find_mention(&self, mention_id: Uuid) -> AppResult<Option<ChatMention>> {
        sqlx::query_as::<_, ChatMention>("SELECT * FROM chat_mentions WHERE id = $1")
            .bind(mention_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find mention", e))
    }

    async fn mark_mention_read(&self, mention_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE chat_mentions SET read = TRUE WHERE id = $1 AND read = FALSE")
                .bind(mention_id)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to mark mention read", e))?;

        Ok(result.rows_affected() > 0)
    }
}
