//! In-memory change feed for single-node deployments.

use tokio::sync::broadcast;

use projecthub_core::events::{ChangeEvent, ChangeFilter};
use projecthub_core::feed::{ChangeFeed, ChangeFeedPublisher, FeedSubscription};

/// In-memory change feed backed by a tokio broadcast channel.
///
/// Services publish after each successful store mutation; subscribers
/// apply their own equality filters. A full channel drops the oldest
/// events for lagging subscribers, which the reconciliation pass repairs.
#[derive(Debug)]
pub struct MemoryChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl MemoryChangeFeed {
    /// Create a new feed with the given buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }
}

impl ChangeFeed for MemoryChangeFeed {
    fn subscribe(&self, filter: ChangeFilter) -> FeedSubscription {
        FeedSubscription::new(filter, self.tx.subscribe())
    }
}

impl ChangeFeedPublisher for MemoryChangeFeed {
    fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}
