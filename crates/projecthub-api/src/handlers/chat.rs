//! Chat posting handler.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use projecthub_entity::chat::ChatMessage;

use crate::dto::request::{PostMessageRequest, validated};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::ApiState;

/// POST /api/chat/messages
pub async fn post_message(
    State(state): State<ApiState>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<ApiResponse<ChatMessage>>, ApiError> {
    let req = validated(req)?;
    let message = state
        .chat
        .post_message(
            req.project_id,
            &req.username,
            &req.message,
            req.client_key,
            Utc::now(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(message)))
}
