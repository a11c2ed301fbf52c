//! Event notice repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use projecthub_core::result::AppResult;
use projecthub_entity::event::ProjectEvent;
use projecthub_entity::notification::EventNotice;

use crate::repositories::db_error;
use crate::store::NoticeStore;

/// Repository for scheduled events and their per-recipient notices.
#[derive(Debug, Clone)]
pub struct NoticeRepository {
    pool: PgPool,
}

impl NoticeRepository {
    /// Create a new notice repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoticeStore for NoticeRepository {
    async fn insert_event(&self, event: &ProjectEvent) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO project_events (id, project_id, topic, event_date, created_by, created_at, deleted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.id)
        .bind(event.project_id)
        .bind(&event.topic)
        .bind(event.event_date)
        .bind(&event.created_by)
        .bind(event.created_at)
        .bind(event.deleted)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert scheduled event", e))?;
        Ok(())
    }

    async fn soft_delete_event(&self, event_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE project_events SET deleted = TRUE WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to soft-delete event", e))?;
        Ok(())
    }

    async fn insert_notices(&self, notices: &[EventNotice]) -> AppResult<()> {
        for notice in notices {
            sqlx::query(
                "INSERT INTO event_notices (id, project_id, event_id, topic, created_by, recipient, created_at, read) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (event_id, recipient) DO NOTHING",
            )
            .bind(notice.id)
            .bind(notice.project_id)
            .bind(notice.event_id)
            .bind(&notice.topic)
            .bind(&notice.created_by)
            .bind(&notice.recipient)
            .bind(notice.created_at)
            .bind(notice.read)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to insert event notice", e))?;
        }
        Ok(())
    }

    async fn unread_notices(
        &self,
        recipient: &str,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<EventNotice>> {
        let base = "SELECT n.id, n.project_id, n.event_id, n.topic, n.created_by, n.recipient, \
                    e.event_date, n.created_at, n.read \
                    FROM event_notices n JOIN project_events e ON e.id = n.event_id \
                    WHERE n.recipient = $1 AND n.read = FALSE AND e.deleted = FALSE";

        match project_id {
            Some(project_id) => sqlx::query_as::<_, EventNotice>(&format!(
                "{base} AND n.project_id = $2 ORDER BY n.created_at DESC"
            ))
            .bind(recipient)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as::<_, EventNotice>(&format!(
                "{base} ORDER BY n.created_at DESC"
            ))
            .bind(recipient)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| db_error("Failed to list unread notices", e))
    }

    async fn mark_event_read(
        &self,
        event_id: Uuid,
        recipient: &str,
        project_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE event_notices SET read = TRUE \
             WHERE event_id = $1 AND recipient = $2 AND project_id = $3 AND read = FALSE",
        )
        .bind(event_id)
        .bind(recipient)
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark notice read", e))?;

        Ok(result.rows_affected() > 0)
    }
}
