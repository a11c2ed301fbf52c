//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use projecthub_api::router::build_router;
use projecthub_api::state::ApiState;
use projecthub_core::config::{AppConfig, DatabaseConfig, ServerConfig};
use projecthub_database::provider::StoreManager;
use projecthub_realtime::bridge::MemoryChangeFeed;
use projecthub_realtime::registry::LiveFeedRegistry;
use projecthub_service::audit::AuditLedger;
use projecthub_service::chat::ChatService;
use projecthub_service::notification::{NoticeFanout, NotificationAggregator};

/// Test application over the in-memory store backend.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for direct service access
    pub state: ApiState,
}

impl TestApp {
    /// Build a fresh application over an empty in-memory store.
    pub fn new() -> Self {
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                provider: "memory".to_string(),
                ..DatabaseConfig::default()
            },
            notifications: Default::default(),
            realtime: Default::default(),
            logging: Default::default(),
        };

        let stores = StoreManager::in_memory();
        let change_feed = Arc::new(MemoryChangeFeed::new(64));

        let ledger = Arc::new(AuditLedger::new(
            Arc::clone(&stores.audit),
            change_feed.clone(),
        ));
        let aggregator = Arc::new(NotificationAggregator::new(
            Arc::clone(&stores.audit),
            Arc::clone(&stores.notices),
            Arc::clone(&stores.chat),
            Arc::clone(&stores.roster),
            change_feed.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            Arc::clone(&stores.chat),
            Arc::clone(&stores.roster),
            change_feed.clone(),
        ));
        let fanout = Arc::new(NoticeFanout::new(
            Arc::clone(&stores.notices),
            Arc::clone(&stores.roster),
            change_feed.clone(),
        ));
        let live_feeds = Arc::new(LiveFeedRegistry::new(
            Arc::clone(&aggregator),
            change_feed.clone(),
            config.realtime.clone(),
        ));

        let state = ApiState {
            config: Arc::new(config),
            stores,
            ledger,
            aggregator,
            chat,
            fanout,
            live_feeds,
        };

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Create a project over the API and return its id.
    pub async fn create_project(&self, created_by: &str, members: &[&str]) -> Uuid {
        let (status, body) = self
            .post(
                "/api/projects",
                serde_json::json!({
                    "name": "bridge",
                    "created_by": created_by,
                    "members": members,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    /// Issue a POST with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Issue a GET.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
