//! The full roster-of-six walkthrough, driven through the services.

use chrono::Utc;
use uuid::Uuid;

use projecthub_core::types::ViewerScope;
use projecthub_entity::audit::Subject;
use projecthub_service::audit::RecordOutcome;
use projecthub_service::readstate::{self, CompletionPolicy};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_roster_of_six_walkthrough() {
    let app = TestApp::new();
    let project_id = app
        .create_project("a", &["a", "b", "c", "d", "e", "f"])
        .await;
    let subject = Subject::new(project_id, "drawings", "report.pdf");
    let policy = CompletionPolicy::from_config(&app.state.config.notifications);
    let now = Utc::now();

    // `a` uploads report.pdf.
    app.state
        .ledger
        .record_upload(&subject, "a", now)
        .await
        .unwrap();

    let count = |user: &str| {
        let aggregator = app.state.aggregator.clone();
        let scope = ViewerScope::project(user, project_id);
        async move { aggregator.unread_count(&scope, Utc::now()).await.unwrap() }
    };

    assert_eq!(count("a").await, 0);
    assert_eq!(count("b").await, 1);

    // `b` previews: their own counter clears, `a` is unaffected, and
    // completion is one of five.
    app.state
        .ledger
        .record_preview(&subject, "b", Utc::now())
        .await
        .unwrap();
    assert_eq!(count("a").await, 0);
    assert_eq!(count("b").await, 0);

    let completion_state = |records: &[projecthub_entity::audit::AuditRecord]| {
        readstate::completion(records, "report.pdf", 6, policy)
    };
    let records = app.state.ledger.project_log(project_id, None).await.unwrap();
    assert!(!completion_state(&records).fully_viewed);

    // `c`, `d`, `e` preview; still one short.
    for user in ["c", "d", "e"] {
        app.state
            .ledger
            .record_preview(&subject, user, Utc::now())
            .await
            .unwrap();
    }
    let records = app.state.ledger.project_log(project_id, None).await.unwrap();
    assert!(!completion_state(&records).fully_viewed);

    // `f` is the fifth distinct non-uploader viewer.
    app.state
        .ledger
        .record_preview(&subject, "f", Utc::now())
        .await
        .unwrap();
    let records = app.state.ledger.project_log(project_id, None).await.unwrap();
    assert!(completion_state(&records).fully_viewed);

    // A duplicate preview by `b` leaves the set and the flag unchanged.
    let outcome = app
        .state
        .ledger
        .record_preview(&subject, "b", Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, RecordOutcome::AlreadyRecorded);

    let records = app.state.ledger.project_log(project_id, None).await.unwrap();
    let preview = records
        .iter()
        .find(|r| r.action == projecthub_entity::audit::AuditAction::Preview)
        .unwrap();
    assert_eq!(preview.viewed_by.len(), 5);
    assert!(completion_state(&records).fully_viewed);
}

#[tokio::test]
async fn test_aggregate_identical_across_calls() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &["a", "b", "c"]).await;
    let subject = Subject::new(project_id, "drawings", "report.pdf");

    app.state
        .ledger
        .record_upload(&subject, "a", Utc::now())
        .await
        .unwrap();
    app.state
        .chat
        .post_message(project_id, "a", "@b see report.pdf", Some(Uuid::new_v4()), Utc::now())
        .await
        .unwrap();

    let scope = ViewerScope::project("b", project_id);
    let first = app.state.aggregator.aggregate(&scope).await.unwrap();
    let second = app.state.aggregator.aggregate(&scope).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.uploads.len(), 1);
    assert_eq!(first.mentions.len(), 1);
}
