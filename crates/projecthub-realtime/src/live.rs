//! Per-viewer live notification feed.
//!
//! Push events are merged as they arrive for latency; a periodic full
//! aggregation is the authority and supersedes whatever the pushes
//! built up (last-reconciliation-wins). Locally-originated optimistic
//! placeholders are replaced in place when the store echoes their
//! idempotency key back through the feed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock, watch};
use tokio::time::MissedTickBehavior;
use tracing::warn;
use uuid::Uuid;

use projecthub_core::config::realtime::RealtimeConfig;
use projecthub_core::error::{AppError, ErrorKind};
use projecthub_core::events::{ChangeEvent, ChangeFilter};
use projecthub_core::feed::ChangeFeed;
use projecthub_core::result::AppResult;
use projecthub_core::types::ViewerScope;
use projecthub_entity::notification::{
    EventNotice, NotificationFeed, NotificationItem, NotificationKey, NotificationKind,
};
use projecthub_service::notification::NotificationAggregator;

use crate::dedup::EventDeduplicator;
use crate::scope::{ScopeToken, ScopeTracker};

struct LiveState {
    scope: ViewerScope,
    feed: NotificationFeed,
    /// Idempotency key → identity key of the optimistic placeholder.
    placeholders: HashMap<Uuid, NotificationKey>,
}

/// Live view of one viewer's notification feed.
pub struct LiveNotificationFeed {
    aggregator: Arc<NotificationAggregator>,
    changes: Arc<dyn ChangeFeed>,
    scopes: ScopeTracker,
    dedup: EventDeduplicator,
    state: RwLock<LiveState>,
    snapshot_tx: watch::Sender<NotificationFeed>,
    scope_changed: Notify,
    reconcile_interval: Duration,
}

impl LiveNotificationFeed {
    /// Create a live feed for an initial viewer scope.
    pub fn new(
        aggregator: Arc<NotificationAggregator>,
        changes: Arc<dyn ChangeFeed>,
        scope: ViewerScope,
        config: &RealtimeConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(NotificationFeed::default());
        Self {
            aggregator,
            changes,
            scopes: ScopeTracker::new(),
            dedup: EventDeduplicator::new(config.dedup_window_ms),
            state: RwLock::new(LiveState {
                scope,
                feed: NotificationFeed::default(),
                placeholders: HashMap::new(),
            }),
            snapshot_tx,
            scope_changed: Notify::new(),
            reconcile_interval: Duration::from_secs(config.reconcile_interval_seconds.max(1)),
        }
    }

    /// The current scope.
    pub async fn scope(&self) -> ViewerScope {
        self.state.read().await.scope.clone()
    }

    /// Current feed snapshot.
    pub async fn snapshot(&self) -> NotificationFeed {
        self.state.read().await.feed.clone()
    }

    /// Watch snapshot updates; the receiver yields after every mutation.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<NotificationFeed> {
        self.snapshot_tx.subscribe()
    }

    /// Switch the viewer's scope.
    ///
    /// Invalidates in-flight reconciliations, clears local state, and
    /// signals the run loop to tear its old subscription down before
    /// opening one for the new scope.
    pub async fn set_scope(&self, scope: ViewerScope) -> ScopeToken {
        let token = self.scopes.issue();
        {
            let mut state = self.state.write().await;
            state.scope = scope;
            state.feed = NotificationFeed::default();
            state.placeholders.clear();
        }
        self.snapshot_tx.send_replace(NotificationFeed::default());
        self.scope_changed.notify_one();
        token
    }

    /// Insert a locally-originated optimistic item keyed by its client
    /// idempotency key. The echoed change event replaces it in place.
    pub async fn add_placeholder(&self, item: NotificationItem, client_key: Uuid) {
        let mut state = self.state.write().await;
        state.placeholders.insert(client_key, item.key());
        match item {
            NotificationItem::FileUpload(n) => state.feed.upsert_upload(n),
            NotificationItem::EventNotice(n) => state.feed.insert_event_notice(n),
            NotificationItem::ChatMention(n) => state.feed.insert_mention(n),
        }
        self.snapshot_tx.send_replace(state.feed.clone());
    }

    /// Merge one push event into the feed.
    ///
    /// Returns `true` if the feed changed. Events outside the current
    /// scope and rapid duplicates are ignored.
    pub async fn apply_change(&self, event: ChangeEvent) -> AppResult<bool> {
        if !self.dedup.should_apply(&event.dedup_key()) {
            return Ok(false);
        }

        let mut state = self.state.write().await;
        if !state.scope.covers(event.project_id()) {
            return Ok(false);
        }
        let viewer = state.scope.username.clone();

        // An echo of our own optimistic write: drop the placeholder and
        // let the server copy take its slot below.
        if let Some(client_key) = event.client_key() {
            if let Some(key) = state.placeholders.remove(&client_key) {
                remove_by_key(&mut state.feed, &key);
            }
        }

        let mutated = match event {
            ChangeEvent::FileUploaded {
                project_id,
                folder,
                file_name,
                uploaded_by,
                uploaded_at,
            } => {
                if uploaded_by == viewer {
                    false
                } else {
                    state.feed.upsert_upload(
                        projecthub_entity::notification::FileUploadNotice {
                            project_id,
                            folder,
                            file_name,
                            uploaded_by,
                            uploaded_at,
                        },
                    );
                    true
                }
            }
            ChangeEvent::FileDeleted {
                project_id,
                file_name,
                ..
            } => {
                let before = state.feed.uploads.len();
                state.feed.remove_upload(project_id, &file_name);
                state.feed.uploads.len() != before
            }
            ChangeEvent::MembershipAdded {
                project_id,
                file_name,
                username,
                ..
            } => {
                // The viewer saw the file in another session; everyone
                // else's memberships do not move this viewer's unreads.
                if username == viewer {
                    let before = state.feed.uploads.len();
                    state.feed.remove_upload(project_id, &file_name);
                    state.feed.uploads.len() != before
                } else {
                    false
                }
            }
            ChangeEvent::NoticeCreated {
                notice_id,
                project_id,
                event_id,
                topic,
                created_by,
                recipient,
                event_date,
                created_at,
            } => {
                if recipient == viewer {
                    state.feed.insert_event_notice(EventNotice {
                        id: notice_id,
                        project_id,
                        event_id,
                        topic,
                        created_by,
                        recipient,
                        event_date,
                        created_at,
                        read: false,
                    });
                    true
                } else {
                    false
                }
            }
            ChangeEvent::NoticeRead {
                project_id,
                event_id,
                recipient,
            } => {
                if recipient == viewer {
                    let before = state.feed.events.len();
                    state.feed.remove_event_notice(project_id, event_id);
                    state.feed.events.len() != before
                } else {
                    false
                }
            }
            ChangeEvent::MentionCreated {
                mention_id,
                project_id,
                message_id,
                mentioned_by,
                mentioned_user,
                message,
                created_at,
                ..
            } => {
                if mentioned_user == viewer {
                    state.feed.insert_mention(
                        projecthub_entity::notification::ChatMention {
                            id: mention_id,
                            project_id,
                            message_id,
                            mentioned_by,
                            mentioned_user,
                            message,
                            created_at,
                            read: false,
                        },
                    );
                    true
                } else {
                    false
                }
            }
            ChangeEvent::MentionRead {
                mention_id,
                mentioned_user,
                ..
            } => {
                if mentioned_user == viewer {
                    let before = state.feed.mentions.len();
                    state.feed.remove_mention(mention_id);
                    state.feed.mentions.len() != before
                } else {
                    false
                }
            }
            ChangeEvent::MessagePosted { .. } => false,
        };

        if mutated {
            self.snapshot_tx.send_replace(state.feed.clone());
        }
        Ok(mutated)
    }

    /// Run one authoritative reconciliation pass.
    ///
    /// The result is discarded with a `StaleScope` error if the scope
    /// changed while the aggregation was in flight.
    pub async fn reconcile(&self) -> AppResult<NotificationFeed> {
        let token = self.scopes.current();
        let scope = self.scope().await;
        let fresh = self.aggregator.aggregate(&scope).await?;
        self.install(fresh, token).await
    }

    /// Install an aggregation result unless its scope token went stale.
    async fn install(
        &self,
        fresh: NotificationFeed,
        token: ScopeToken,
    ) -> AppResult<NotificationFeed> {
        let mut state = self.state.write().await;
        if !self.scopes.is_current(token) {
            return Err(AppError::stale_scope(
                "Reconciliation result arrived after a scope change",
            ));
        }
        state.feed = fresh.clone();
        state.placeholders.clear();
        self.snapshot_tx.send_replace(fresh.clone());
        Ok(fresh)
    }

    /// Drive the feed: subscribe for the current scope, merge pushes,
    /// reconcile on a timer, and re-subscribe on scope changes.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.reconcile_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        'outer: loop {
            let filter = match self.scope().await.project_id {
                Some(project_id) => ChangeFilter::project(project_id),
                None => ChangeFilter::all(),
            };
            let mut subscription = self.changes.subscribe(filter);

            if let Err(e) = self.reconcile().await {
                if e.kind != ErrorKind::StaleScope {
                    warn!(error = %e, "Initial reconciliation failed; will retry on next tick");
                }
            }

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break 'outer,
                    // Old-scope subscription is dropped before the outer
                    // loop opens one for the new scope.
                    _ = self.scope_changed.notified() => continue 'outer,
                    _ = ticker.tick() => {
                        match self.reconcile().await {
                            Ok(_) => {}
                            Err(e) if e.kind == ErrorKind::StaleScope => {}
                            Err(e) => warn!(error = %e, "Reconciliation failed; will retry"),
                        }
                        self.dedup.cleanup();
                    }
                    event = subscription.recv() => match event {
                        Some(event) => {
                            if let Err(e) = self.apply_change(event).await {
                                warn!(error = %e, "Failed to merge change event");
                            }
                        }
                        None => break 'outer,
                    },
                }
            }
        }
    }
}

/// Remove whatever item carries the given identity key.
fn remove_by_key(feed: &mut NotificationFeed, key: &NotificationKey) {
    match key.kind {
        NotificationKind::FileUpload => feed.remove_upload(key.project_id, &key.stable_id),
        NotificationKind::EventNotice => {
            if let Ok(event_id) = Uuid::parse_str(&key.stable_id) {
                feed.remove_event_notice(key.project_id, event_id);
            }
        }
        NotificationKind::ChatMention => {
            if let Ok(mention_id) = Uuid::parse_str(&key.stable_id) {
                feed.remove_mention(mention_id);
            }
        }
    }
}
