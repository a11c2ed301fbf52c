//! Application state shared across all handlers.

use std::sync::Arc;

use projecthub_core::config::AppConfig;
use projecthub_database::provider::StoreManager;
use projecthub_realtime::registry::LiveFeedRegistry;
use projecthub_service::audit::AuditLedger;
use projecthub_service::chat::ChatService;
use projecthub_service::notification::{NoticeFanout, NotificationAggregator};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<ApiState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct ApiState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Store handles (audit, notices, chat, roster, projects)
    pub stores: StoreManager,
    /// Audit ledger service
    pub ledger: Arc<AuditLedger>,
    /// Notification aggregator (also the acknowledgement handle)
    pub aggregator: Arc<NotificationAggregator>,
    /// Chat posting service
    pub chat: Arc<ChatService>,
    /// Event notice fan-out service
    pub fanout: Arc<NoticeFanout>,
    /// Per-viewer live feed registry
    pub live_feeds: Arc<LiveFeedRegistry>,
}
