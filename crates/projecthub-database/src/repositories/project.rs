//! Project and roster repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use projecthub_core::result::AppResult;
use projecthub_entity::project::Project;

use crate::repositories::db_error;
use crate::store::{ProjectStore, RosterProvider};

/// Repository for projects and their member rosters.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Create a new project repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterProvider for ProjectRepository {
    async fn project_members(&self, project_id: Uuid) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT username FROM project_members WHERE project_id = $1 ORDER BY username",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list project members", e))
    }

    async fn projects_for(&self, username: &str) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT project_id FROM project_members WHERE username = $1 ORDER BY project_id",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list projects for user", e))
    }
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    async fn insert_project(&self, project: &Project, members: &[String]) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, created_by, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.created_by)
        .bind(project.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert project", e))?;

        for username in members {
            sqlx::query(
                "INSERT INTO project_members (project_id, username, added_at) \
                 VALUES ($1, $2, $3) ON CONFLICT (project_id, username) DO NOTHING",
            )
            .bind(project.id)
            .bind(username)
            .bind(project.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to insert project member", e))?;
        }
        Ok(())
    }
}
