//! HTTP-level tests for audit recording, notifications, and
//! acknowledgements.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

const ROSTER: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

fn audit_body(project_id: uuid::Uuid, file_name: &str, username: &str) -> serde_json::Value {
    json!({
        "project_id": project_id,
        "folder": "drawings",
        "file_name": file_name,
        "username": username,
    })
}

#[tokio::test]
async fn test_preview_flow_over_http() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &ROSTER).await;

    let (status, _) = app
        .post("/api/audit/upload", audit_body(project_id, "report.pdf", "a"))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The uploader has nothing unread; everyone else has one.
    let (_, body) = app
        .get(&format!(
            "/api/notifications/unread-count?username=a&project_id={project_id}"
        ))
        .await;
    assert_eq!(body["data"]["count"], 0);
    let (_, body) = app
        .get(&format!(
            "/api/notifications/unread-count?username=b&project_id={project_id}"
        ))
        .await;
    assert_eq!(body["data"]["count"], 1);

    // First preview records; the duplicate is absorbed silently.
    let (status, body) = app
        .post("/api/audit/preview", audit_body(project_id, "report.pdf", "b"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "updated");

    let (status, body) = app
        .post("/api/audit/preview", audit_body(project_id, "report.pdf", "b"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "already_recorded");

    let (_, body) = app
        .get(&format!(
            "/api/notifications/unread-count?username=b&project_id={project_id}"
        ))
        .await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_completion_over_http() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &ROSTER).await;

    app.post("/api/audit/upload", audit_body(project_id, "report.pdf", "a"))
        .await;

    for user in ["b", "c", "d", "e"] {
        app.post(
            "/api/audit/download",
            audit_body(project_id, "report.pdf", user),
        )
        .await;
    }
    let (_, body) = app
        .get(&format!(
            "/api/projects/{project_id}/files/report.pdf/completion"
        ))
        .await;
    assert_eq!(body["data"]["fully_downloaded"], false);

    // The fifth distinct non-uploader download completes the file; the
    // uploader's own download changes nothing.
    app.post(
        "/api/audit/download",
        audit_body(project_id, "report.pdf", "f"),
    )
    .await;
    app.post(
        "/api/audit/download",
        audit_body(project_id, "report.pdf", "a"),
    )
    .await;

    let (_, body) = app
        .get(&format!(
            "/api/projects/{project_id}/files/report.pdf/completion"
        ))
        .await;
    assert_eq!(body["data"]["fully_downloaded"], true);
}

#[tokio::test]
async fn test_deleted_file_absent_from_feed() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &ROSTER).await;

    app.post("/api/audit/upload", audit_body(project_id, "report.pdf", "a"))
        .await;
    app.post("/api/audit/delete", audit_body(project_id, "report.pdf", "a"))
        .await;

    let (_, body) = app
        .get(&format!(
            "/api/notifications?username=b&project_id={project_id}"
        ))
        .await;
    assert_eq!(body["data"]["uploads"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_event_acknowledgement_idempotent() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &ROSTER).await;

    let (status, body) = app
        .post(
            "/api/events",
            json!({
                "project_id": project_id,
                "topic": "site visit",
                "created_by": "a",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    // One notice per member except the creator.
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    let event_id = body["data"][0]["event_id"].as_str().unwrap().to_string();

    let count_path =
        format!("/api/notifications/unread-count?username=b&project_id={project_id}");
    let (_, body) = app.get(&count_path).await;
    assert_eq!(body["data"]["count"], 1);

    for _ in 0..2 {
        let (status, _) = app
            .post(
                &format!("/api/notifications/events/{event_id}/read"),
                json!({ "username": "b", "project_id": project_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = app.get(&count_path).await;
        assert_eq!(body["data"]["count"], 0);
    }

    // Other recipients keep their unread notice.
    let (_, body) = app
        .get(&format!(
            "/api/notifications/unread-count?username=c&project_id={project_id}"
        ))
        .await;
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn test_mention_flow_over_http() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &ROSTER).await;

    let (status, _) = app
        .post(
            "/api/chat/messages",
            json!({
                "project_id": project_id,
                "username": "a",
                "message": "@b the drawings are ready",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let feed_path = format!("/api/notifications?username=b&project_id={project_id}");
    let (_, body) = app.get(&feed_path).await;
    let mentions = body["data"]["mentions"].as_array().unwrap();
    assert_eq!(mentions.len(), 1);
    let mention_id = mentions[0]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            &format!("/api/notifications/mentions/{mention_id}/read"),
            json!({ "username": "b" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&feed_path).await;
    assert_eq!(body["data"]["mentions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_validation_rejects_blank_username() {
    let app = TestApp::new();
    let project_id = app.create_project("a", &["a", "b"]).await;

    let (status, _) = app
        .post("/api/audit/preview", audit_body(project_id, "report.pdf", ""))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_roster() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let project_id = app.create_project("a", &ROSTER).await;
    let (_, body) = app
        .get(&format!("/api/projects/{project_id}/members"))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
}
