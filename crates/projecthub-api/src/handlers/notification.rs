//! Notification feed, counter, acknowledgement, and event handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use uuid::Uuid;

use projecthub_core::types::ViewerScope;
use projecthub_entity::event::ProjectEvent;
use projecthub_entity::notification::{EventNotice, NotificationFeed};

use crate::dto::request::{
    CreateEventRequest, MarkEventReadRequest, MarkMentionReadRequest, ScopeQuery, validated,
};
use crate::dto::response::{ApiResponse, CountResponse, MessageResponse};
use crate::error::ApiError;
use crate::state::ApiState;

fn scope_from(query: &ScopeQuery) -> ViewerScope {
    match query.project_id {
        Some(project_id) => ViewerScope::project(&query.username, project_id),
        None => ViewerScope::global(&query.username),
    }
}

/// GET /api/notifications
pub async fn feed(
    State(state): State<ApiState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ApiResponse<NotificationFeed>>, ApiError> {
    let query = validated(query)?;
    let feed = state.aggregator.aggregate(&scope_from(&query)).await?;
    Ok(Json(ApiResponse::ok(feed)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<ApiState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let query = validated(query)?;
    let count = state
        .aggregator
        .unread_count(&scope_from(&query), Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// POST /api/notifications/events/{event_id}/read
pub async fn mark_event_read(
    State(state): State<ApiState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<MarkEventReadRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let req = validated(req)?;
    state
        .aggregator
        .mark_event_read(event_id, &req.username, req.project_id)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Marked as read".to_string(),
    })))
}

/// POST /api/notifications/mentions/{mention_id}/read
pub async fn mark_mention_read(
    State(state): State<ApiState>,
    Path(mention_id): Path<Uuid>,
    Json(req): Json<MarkMentionReadRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let req = validated(req)?;
    state
        .aggregator
        .mark_mention_read(mention_id, &req.username)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Marked as read".to_string(),
    })))
}

/// POST /api/events
pub async fn create_event(
    State(state): State<ApiState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<ApiResponse<Vec<EventNotice>>>, ApiError> {
    let req = validated(req)?;
    let event = ProjectEvent {
        id: Uuid::new_v4(),
        project_id: req.project_id,
        topic: req.topic,
        event_date: req.event_date,
        created_by: req.created_by,
        created_at: Utc::now(),
        deleted: false,
    };
    let notices = state.fanout.event_created(&event).await?;
    Ok(Json(ApiResponse::ok(notices)))
}

/// POST /api/events/{event_id}/delete
pub async fn delete_event(
    State(state): State<ApiState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.fanout.event_deleted(event_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Event deleted".to_string(),
    })))
}
