//! Route definitions for the ProjectHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `ApiState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ApiState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .merge(audit_routes())
        .merge(notification_routes())
        .merge(event_routes())
        .merge(chat_routes())
        .merge(project_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Audit recording and activity log endpoints
fn audit_routes() -> Router<ApiState> {
    Router::new()
        .route("/audit/preview", post(handlers::audit::record_preview))
        .route("/audit/download", post(handlers::audit::record_download))
        .route("/audit/upload", post(handlers::audit::record_upload))
        .route("/audit/delete", post(handlers::audit::record_delete))
        .route("/folders", post(handlers::audit::create_folder))
        .route("/folders/delete", post(handlers::audit::delete_folder))
        .route("/links/delete", post(handlers::audit::delete_link))
        .route("/projects/{id}/logs", get(handlers::audit::project_log))
        .route(
            "/projects/{id}/files/{file_name}/completion",
            get(handlers::audit::file_completion),
        )
}

/// Notification feed and acknowledgement endpoints
fn notification_routes() -> Router<ApiState> {
    Router::new()
        .route("/notifications", get(handlers::notification::feed))
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/events/{event_id}/read",
            post(handlers::notification::mark_event_read),
        )
        .route(
            "/notifications/mentions/{mention_id}/read",
            post(handlers::notification::mark_mention_read),
        )
}

/// Scheduled event endpoints
fn event_routes() -> Router<ApiState> {
    Router::new()
        .route("/events", post(handlers::notification::create_event))
        .route(
            "/events/{event_id}/delete",
            post(handlers::notification::delete_event),
        )
}

/// Chat endpoints
fn chat_routes() -> Router<ApiState> {
    Router::new().route("/chat/messages", post(handlers::chat::post_message))
}

/// Project endpoints
fn project_routes() -> Router<ApiState> {
    Router::new()
        .route("/projects", post(handlers::project::create_project))
        .route(
            "/projects/{id}/members",
            get(handlers::project::project_members),
        )
}

/// Health endpoints
fn health_routes() -> Router<ApiState> {
    Router::new().route("/health", get(handlers::health::health))
}
