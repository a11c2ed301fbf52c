//! Change-feed boundary contracts.
//!
//! The publisher side is invoked by services after each successful store
//! mutation; the subscriber side is consumed by the live reconciliation
//! layer. Delivery is at-least-once and unordered: a lagged subscriber
//! skips ahead rather than erroring, and the next reconciliation pass
//! repairs whatever was missed.

use tokio::sync::broadcast;

use crate::events::{ChangeEvent, ChangeFilter};

/// A filtered handle onto the change stream.
pub struct FeedSubscription {
    filter: ChangeFilter,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl FeedSubscription {
    /// Wrap a raw broadcast receiver with an equality filter.
    pub fn new(filter: ChangeFilter, rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { filter, rx }
    }

    /// Receive the next event matching the subscription filter.
    ///
    /// Returns `None` once the feed is closed. Lag is absorbed silently.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Change-feed subscriber lagged; skipping ahead");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Subscriber side of the change feed.
pub trait ChangeFeed: Send + Sync {
    /// Open a subscription restricted by equality predicates on the
    /// project and source fields.
    fn subscribe(&self, filter: ChangeFilter) -> FeedSubscription;
}

/// Publisher side of the change feed.
pub trait ChangeFeedPublisher: Send + Sync {
    /// Publish a change event to all current subscribers.
    ///
    /// Publishing never fails; an event with no subscribers is dropped.
    fn publish(&self, event: ChangeEvent);
}
