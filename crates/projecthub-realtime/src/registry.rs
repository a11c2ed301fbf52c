//! Per-viewer live feed registry.
//!
//! One live feed per username; a session attaching with a different
//! scope re-points the existing feed instead of stacking subscriptions.
//! Detaching tears the feed's run loop down.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use projecthub_core::config::realtime::RealtimeConfig;
use projecthub_core::feed::ChangeFeed;
use projecthub_core::types::ViewerScope;
use projecthub_service::notification::NotificationAggregator;

use crate::live::LiveNotificationFeed;

struct LiveFeedHandle {
    feed: Arc<LiveNotificationFeed>,
    shutdown: watch::Sender<bool>,
}

/// Registry of running live feeds, keyed by username.
pub struct LiveFeedRegistry {
    aggregator: Arc<NotificationAggregator>,
    changes: Arc<dyn ChangeFeed>,
    config: RealtimeConfig,
    feeds: DashMap<String, LiveFeedHandle>,
}

impl LiveFeedRegistry {
    /// Create an empty registry.
    pub fn new(
        aggregator: Arc<NotificationAggregator>,
        changes: Arc<dyn ChangeFeed>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            aggregator,
            changes,
            config,
            feeds: DashMap::new(),
        }
    }

    /// Attach a viewer session, starting the feed's run loop on first
    /// attach and re-scoping the existing feed otherwise.
    pub async fn attach(&self, scope: ViewerScope) -> Arc<LiveNotificationFeed> {
        let existing = match self.feeds.entry(scope.username.clone()) {
            Entry::Occupied(occupied) => occupied.get().feed.clone(),
            Entry::Vacant(vacant) => {
                let feed = Arc::new(LiveNotificationFeed::new(
                    Arc::clone(&self.aggregator),
                    Arc::clone(&self.changes),
                    scope.clone(),
                    &self.config,
                ));
                let (shutdown, shutdown_rx) = watch::channel(false);
                vacant.insert(LiveFeedHandle {
                    feed: Arc::clone(&feed),
                    shutdown,
                });
                tokio::spawn(Arc::clone(&feed).run(shutdown_rx));
                return feed;
            }
        };

        if existing.scope().await != scope {
            existing.set_scope(scope).await;
        }
        existing
    }

    /// Detach a viewer: stop the run loop and drop the feed.
    pub fn detach(&self, username: &str) {
        if let Some((_, handle)) = self.feeds.remove(username) {
            let _ = handle.shutdown.send(true);
        }
    }

    /// Stop every running feed.
    pub fn shutdown_all(&self) {
        for handle in self.feeds.iter() {
            let _ = handle.shutdown.send(true);
        }
        self.feeds.clear();
    }

    /// Number of attached viewers.
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    /// Whether no viewer is attached.
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use projecthub_database::memory::MemoryStore;
    use projecthub_database::store::ProjectStore;
    use projecthub_entity::project::Project;
    use uuid::Uuid;

    use crate::bridge::MemoryChangeFeed;

    async fn registry() -> (LiveFeedRegistry, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let project = Project {
            id: Uuid::new_v4(),
            name: "bridge".to_string(),
            created_by: "a".to_string(),
            created_at: Utc::now(),
        };
        store
            .insert_project(&project, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let changes = Arc::new(MemoryChangeFeed::new(16));
        let aggregator = Arc::new(NotificationAggregator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            changes.clone(),
        ));
        (
            LiveFeedRegistry::new(aggregator, changes, RealtimeConfig::default()),
            project.id,
        )
    }

    #[tokio::test]
    async fn test_attach_reuses_feed_per_viewer() {
        let (registry, project_id) = registry().await;

        let first = registry.attach(ViewerScope::project("b", project_id)).await;
        let second = registry.attach(ViewerScope::project("b", project_id)).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        // A different scope re-points the same feed.
        let global = registry.attach(ViewerScope::global("b")).await;
        assert!(Arc::ptr_eq(&first, &global));
        assert_eq!(global.scope().await, ViewerScope::global("b"));
    }

    #[tokio::test]
    async fn test_detach_removes_feed() {
        let (registry, project_id) = registry().await;
        registry.attach(ViewerScope::project("b", project_id)).await;
        assert_eq!(registry.len(), 1);
        registry.detach("b");
        assert!(registry.is_empty());
    }
}
