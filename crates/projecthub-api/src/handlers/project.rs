//! Project creation and roster handlers.

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

use projecthub_entity::project::Project;

use crate::dto::request::{CreateProjectRequest, validated};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::ApiState;

/// POST /api/projects
pub async fn create_project(
    State(state): State<ApiState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let req = validated(req)?;
    let project = Project {
        id: Uuid::new_v4(),
        name: req.name,
        created_by: req.created_by.clone(),
        created_at: Utc::now(),
    };

    let mut members = req.members;
    if !members.iter().any(|m| m == &req.created_by) {
        members.push(req.created_by.clone());
    }
    state.stores.projects.insert_project(&project, &members).await?;
    state
        .ledger
        .record_project_created(project.id, &req.created_by, project.created_at)
        .await?;
    Ok(Json(ApiResponse::ok(project)))
}

/// GET /api/projects/{id}/members
pub async fn project_members(
    State(state): State<ApiState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let members = state.stores.roster.project_members(project_id).await?;
    Ok(Json(ApiResponse::ok(members)))
}
