//! Audit record repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use projecthub_core::error::AppError;
use projecthub_core::result::AppResult;
use projecthub_entity::audit::{Acknowledgement, AuditAction, AuditRecord, NewAuditAction, Subject};

use crate::repositories::db_error;
use crate::store::AuditStore;

/// Repository for audit records and their membership sets.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

/// Membership row joined back to its record during batch loads.
#[derive(Debug, FromRow)]
struct MemberRow {
    record_id: Uuid,
    username: String,
    acked_at: DateTime<Utc>,
}

impl AuditRepository {
    /// Create a new audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load membership rows for a set of records and attach each to the
    /// set matching its record's action.
    async fn attach_members(&self, records: &mut [AuditRecord]) -> AppResult<()> {
        let membership_ids: Vec<Uuid> = records
            .iter()
            .filter(|r| r.action.is_membership())
            .map(|r| r.id)
            .collect();
        if membership_ids.is_empty() {
            return Ok(());
        }

        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT record_id, username, acked_at FROM audit_members \
             WHERE record_id = ANY($1) ORDER BY acked_at, username",
        )
        .bind(&membership_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load membership sets", e))?;

        let mut by_record: HashMap<Uuid, Vec<Acknowledgement>> = HashMap::new();
        for row in rows {
            by_record.entry(row.record_id).or_default().push(Acknowledgement {
                username: row.username,
                acked_at: row.acked_at,
            });
        }

        for record in records.iter_mut() {
            let members = by_record.remove(&record.id).unwrap_or_default();
            match record.action {
                AuditAction::Preview => record.viewed_by = members,
                AuditAction::Download => record.downloaded_by = members,
                _ => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn insert_action(&self, action: &NewAuditAction) -> AppResult<AuditRecord> {
        sqlx::query_as::<_, AuditRecord>(
            "INSERT INTO audit_records (id, project_id, folder, subject_name, action, actor, acted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(action.project_id)
        .bind(&action.folder)
        .bind(&action.subject_name)
        .bind(action.action)
        .bind(&action.actor)
        .bind(action.acted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert audit record", e))
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

        let inserted = sqlx::query_as::<_, AuditRecord>(
            "INSERT INTO audit_records (id, project_id, folder, subject_name, action, actor, acted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (project_id, folder, subject_name, action) \
             WHERE action IN ('preview', 'download') DO NOTHING \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(subject.project_id)
        .bind(&subject.folder)
        .bind(&subject.file_name)
        .bind(action)
        .bind(actor)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upsert membership record", e))?;

        if let Some(record) = inserted {
            return Ok(record);
        }

        // Lost the creation race; the winner's row must be there now.
        let mut existing = sqlx::query_as::<_, AuditRecord>(
            "SELECT * FROM audit_records \
             WHERE project_id = $1 AND folder = $2 AND subject_name = $3 AND action = $4",
        )
        .bind(subject.project_id)
        .bind(&subject.folder)
        .bind(&subject.file_name)
        .bind(action)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to re-read membership record", e))?
        .ok_or_else(|| {
            AppError::conflict(format!(
                "Membership record for '{}' vanished between insert and re-read",
                subject.file_name
            ))
        })?;

        self.attach_members(std::slice::from_mut(&mut existing)).await?;
        Ok(existing)
    }

    async fn add_member(
        &self,
        record_id: Uuid,
        username: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO audit_members (record_id, username, acked_at) \
             VALUES ($1, $2, $3) ON CONFLICT (record_id, username) DO NOTHING",
        )
        .bind(record_id)
        .bind(username)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to add membership entry", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_uploader(&self, subject: &Subject) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT actor FROM audit_records \
             WHERE project_id = $1 AND folder = $2 AND subject_name = $3 AND action = 'upload' \
             ORDER BY acted_at ASC LIMIT 1",
        )
        .bind(subject.project_id)
        .bind(&subject.folder)
        .bind(&subject.file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to look up uploader", e))
    }

    async fn query_project_actions(
        &self,
        project_id: Uuid,
        folder: Option<&str>,
    ) -> AppResult<Vec<AuditRecord>> {
        let mut records = match folder {
            Some(folder) => {
                sqlx::query_as::<_, AuditRecord>(
                    "SELECT * FROM audit_records WHERE project_id = $1 AND folder = $2 \
                     ORDER BY acted_at DESC",
                )
                .bind(project_id)
                .bind(folder)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, AuditRecord>(
                    "SELECT * FROM audit_records WHERE project_id = $1 ORDER BY acted_at DESC",
                )
                .bind(project_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| db_error("Failed to query audit records", e))?;

        self.attach_members(&mut records).await?;
        Ok(records)
    }
}
