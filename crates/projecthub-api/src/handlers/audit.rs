//! Audit recording handlers.
//!
//! Recording is best-effort for the initiating action: a duplicate is a
//! normal success (`already_recorded`), and only store unavailability
//! surfaces as an error.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use projecthub_entity::audit::{AuditRecord, Subject};
use projecthub_service::readstate::{self, CompletionPolicy};

use crate::dto::request::{
    FolderActionRequest, LinkActionRequest, LogQuery, RecordActionRequest, validated,
};
use crate::dto::response::{ApiResponse, CompletionResponse, OutcomeResponse};
use crate::error::ApiError;
use crate::state::ApiState;

/// POST /api/audit/preview
pub async fn record_preview(
    State(state): State<ApiState>,
    Json(req): Json<RecordActionRequest>,
) -> Result<Json<ApiResponse<OutcomeResponse>>, ApiError> {
    let req = validated(req)?;
    let subject = Subject::new(req.project_id, &req.folder, &req.file_name);
    let outcome = state
        .ledger
        .record_preview(&subject, &req.username, req.at())
        .await?;
    Ok(Json(ApiResponse::ok(OutcomeResponse { outcome })))
}

/// POST /api/audit/download
pub async fn record_download(
    State(state): State<ApiState>,
    Json(req): Json<RecordActionRequest>,
) -> Result<Json<ApiResponse<OutcomeResponse>>, ApiError> {
    let req = validated(req)?;
    let subject = Subject::new(req.project_id, &req.folder, &req.file_name);
    let outcome = state
        .ledger
        .record_download(&subject, &req.username, req.at())
        .await?;
    Ok(Json(ApiResponse::ok(OutcomeResponse { outcome })))
}

/// POST /api/audit/upload
pub async fn record_upload(
    State(state): State<ApiState>,
    Json(req): Json<RecordActionRequest>,
) -> Result<Json<ApiResponse<AuditRecord>>, ApiError> {
    let req = validated(req)?;
    let subject = Subject::new(req.project_id, &req.folder, &req.file_name);
    let record = state
        .ledger
        .record_upload(&subject, &req.username, req.at())
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/audit/delete
pub async fn record_delete(
    State(state): State<ApiState>,
    Json(req): Json<RecordActionRequest>,
) -> Result<Json<ApiResponse<AuditRecord>>, ApiError> {
    let req = validated(req)?;
    let subject = Subject::new(req.project_id, &req.folder, &req.file_name);
    let record = state
        .ledger
        .record_delete(&subject, &req.username, req.at())
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<ApiState>,
    Json(req): Json<FolderActionRequest>,
) -> Result<Json<ApiResponse<AuditRecord>>, ApiError> {
    let req = validated(req)?;
    let record = state
        .ledger
        .record_folder(req.project_id, &req.folder, true, &req.username, chrono::Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/folders/delete
pub async fn delete_folder(
    State(state): State<ApiState>,
    Json(req): Json<FolderActionRequest>,
) -> Result<Json<ApiResponse<AuditRecord>>, ApiError> {
    let req = validated(req)?;
    let record = state
        .ledger
        .record_folder(req.project_id, &req.folder, false, &req.username, chrono::Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/links/delete
pub async fn delete_link(
    State(state): State<ApiState>,
    Json(req): Json<LinkActionRequest>,
) -> Result<Json<ApiResponse<AuditRecord>>, ApiError> {
    let req = validated(req)?;
    let record = state
        .ledger
        .record_link_deleted(
            req.project_id,
            req.folder.as_deref(),
            &req.link_name,
            &req.username,
            chrono::Utc::now(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// GET /api/projects/{id}/logs
pub async fn project_log(
    State(state): State<ApiState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<Vec<AuditRecord>>>, ApiError> {
    let records = state
        .ledger
        .project_log(project_id, query.folder.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /api/projects/{id}/files/{file_name}/completion
pub async fn file_completion(
    State(state): State<ApiState>,
    Path((project_id, file_name)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<CompletionResponse>>, ApiError> {
    let records = state.ledger.project_log(project_id, None).await?;
    let roster = state.stores.roster.project_members(project_id).await?;
    let policy = CompletionPolicy::from_config(&state.config.notifications);
    let completion = readstate::completion(&records, &file_name, roster.len(), policy);
    Ok(Json(ApiResponse::ok(CompletionResponse {
        fully_viewed: completion.fully_viewed,
        fully_downloaded: completion.fully_downloaded,
    })))
}
