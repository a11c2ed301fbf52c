//! End-to-end tests for the live reconciliation layer: ledger writes
//! flow through the change feed into per-viewer snapshots, and the
//! periodic full aggregation remains the authority.

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use projecthub_core::types::ViewerScope;
use projecthub_entity::audit::Subject;
use projecthub_entity::notification::NotificationFeed;
use projecthub_realtime::live::LiveNotificationFeed;

use crate::helpers::TestApp;

/// Poll a live feed snapshot until the predicate holds.
async fn wait_for(
    feed: &LiveNotificationFeed,
    predicate: impl Fn(&NotificationFeed) -> bool,
) -> NotificationFeed {
    for _ in 0..100 {
        let snapshot = feed.snapshot().await;
        if predicate(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("live feed never reached the expected state");
}

#[tokio::test]
async fn test_upload_reaches_live_snapshot() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &["a", "b"]).await;
    let subject = Subject::new(project_id, "drawings", "report.pdf");

    let feed = app
        .state
        .live_feeds
        .attach(ViewerScope::project("b", project_id))
        .await;
    // Let the run loop open its subscription before writing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    app.state
        .ledger
        .record_upload(&subject, "a", Utc::now())
        .await
        .unwrap();
    let snapshot = wait_for(&feed, |f| !f.uploads.is_empty()).await;
    assert_eq!(snapshot.uploads[0].file_name, "report.pdf");

    // `b` previews in another session; the echo clears the unread.
    app.state
        .ledger
        .record_preview(&subject, "b", Utc::now())
        .await
        .unwrap();
    wait_for(&feed, |f| f.uploads.is_empty()).await;

    app.state.live_feeds.detach("b");
}

#[tokio::test]
async fn test_mention_and_acknowledgement_reach_live_snapshot() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &["a", "b"]).await;

    let feed = app
        .state
        .live_feeds
        .attach(ViewerScope::project("b", project_id))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    app.state
        .chat
        .post_message(
            project_id,
            "a",
            "@b drawings are up",
            Some(Uuid::new_v4()),
            Utc::now(),
        )
        .await
        .unwrap();
    let snapshot = wait_for(&feed, |f| !f.mentions.is_empty()).await;
    let mention_id = snapshot.mentions[0].id;

    app.state
        .aggregator
        .mark_mention_read(mention_id, "b")
        .await
        .unwrap();
    wait_for(&feed, |f| f.mentions.is_empty()).await;

    app.state.live_feeds.detach("b");
}

#[tokio::test]
async fn test_reconcile_is_authoritative() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &["a", "b"]).await;
    let subject = Subject::new(project_id, "drawings", "report.pdf");

    let feed = app
        .state
        .live_feeds
        .attach(ViewerScope::project("b", project_id))
        .await;

    app.state
        .ledger
        .record_upload(&subject, "a", Utc::now())
        .await
        .unwrap();

    // Regardless of what the push path delivered, a direct
    // reconciliation pass lands on the store's truth.
    let fresh = feed.reconcile().await.unwrap();
    assert_eq!(fresh.uploads.len(), 1);

    app.state
        .ledger
        .record_delete(&subject, "a", Utc::now())
        .await
        .unwrap();
    let fresh = feed.reconcile().await.unwrap();
    assert!(fresh.uploads.is_empty());

    app.state.live_feeds.detach("b");
}

#[tokio::test]
async fn test_scope_switch_clears_and_refills() {
    let app = TestApp::new();
    let p1 = app.create_project("a", &["a", "b"]).await;
    let p2 = app.create_project("a", &["a", "b"]).await;

    app.state
        .ledger
        .record_upload(&Subject::new(p1, "drawings", "one.pdf"), "a", Utc::now())
        .await
        .unwrap();
    app.state
        .ledger
        .record_upload(&Subject::new(p2, "drawings", "two.pdf"), "a", Utc::now())
        .await
        .unwrap();

    let feed = app
        .state
        .live_feeds
        .attach(ViewerScope::project("b", p1))
        .await;
    let snapshot = feed.reconcile().await.unwrap();
    assert_eq!(snapshot.uploads.len(), 1);
    assert_eq!(snapshot.uploads[0].file_name, "one.pdf");

    // Switching scope clears the old view immediately; the run loop's
    // re-subscription and reconciliation repopulate it for p2.
    app.state
        .live_feeds
        .attach(ViewerScope::project("b", p2))
        .await;
    let snapshot = wait_for(&feed, |f| {
        f.uploads.len() == 1 && f.uploads[0].file_name == "two.pdf"
    })
    .await;
    assert_eq!(snapshot.uploads[0].project_id, p2);

    app.state.live_feeds.detach("b");
}
