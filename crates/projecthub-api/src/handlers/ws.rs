//! Live-feed WebSocket.
//!
//! A session connects with its viewer scope and receives the full feed
//! snapshot on every change, push merges and reconciliation passes
//! alike. The socket carries snapshots only; acknowledgements go through
//! the REST endpoints.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use tracing::debug;

use projecthub_core::types::ViewerScope;
use projecthub_entity::notification::NotificationFeed;

use crate::dto::request::WsQuery;
use crate::state::ApiState;

/// GET /ws
pub async fn ws_upgrade(
    State(state): State<ApiState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query))
}

async fn handle_socket(mut socket: WebSocket, state: ApiState, query: WsQuery) {
    let scope = match query.project_id {
        Some(project_id) => ViewerScope::project(&query.username, project_id),
        None => ViewerScope::global(&query.username),
    };
    debug!(username = %scope.username, project = ?scope.project_id, "Live feed attached");

    let feed = state.live_feeds.attach(scope).await;
    let mut snapshots = feed.subscribe_snapshots();

    let initial = feed.snapshot().await;
    if send_snapshot(&mut socket, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if send_snapshot(&mut socket, &snapshot).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!(username = %query.username, "Live feed socket closed");
}

async fn send_snapshot(socket: &mut WebSocket, feed: &NotificationFeed) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(feed).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(payload.into())).await
}
