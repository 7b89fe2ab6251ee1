use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use mentorbook_db::MemoryStore;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

fn server() -> TestServer {
    TestServer::new(mentorbook_api::router(Arc::new(MemoryStore::new())))
        .expect("Failed to start test server")
}

// Monday 09:00-17:00 in the given timezone.
async fn seed_profile(server: &TestServer, mentor_id: Uuid, timezone: &str) {
    let response = server
        .put(&format!("/api/mentors/{mentor_id}/availability/rules"))
        .json(&json!({
            "timezone": timezone,
            "rules": [
                { "day_of_week": 1, "start_time": "09:00", "end_time": "17:00", "is_available": true }
            ]
        }))
        .await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_version() {
    let server = server();

    let response = server.get("/health").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "ok");

    let response = server.get("/version").await;
    response.assert_status(StatusCode::OK);
    assert!(response.json::<Value>()["version"].is_string());
}

#[tokio::test]
async fn test_set_rules_creates_profile() {
    let server = server();
    let mentor_id = Uuid::new_v4();
    seed_profile(&server, mentor_id, "Asia/Ulaanbaatar").await;

    let response = server
        .get(&format!("/api/mentors/{mentor_id}/availability"))
        .await;
    response.assert_status(StatusCode::OK);

    let body = response.json::<Value>();
    assert_eq!(body["mentor_id"], mentor_id.to_string());
    assert_eq!(body["timezone"], "Asia/Ulaanbaatar");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["weekly_rules"][0]["start_time"], "09:00");
}

#[tokio::test]
async fn test_profile_creation_requires_timezone() {
    let server = server();
    let mentor_id = Uuid::new_v4();

    let response = server
        .put(&format!("/api/mentors/{mentor_id}/availability/rules"))
        .json(&json!({
            "rules": [
                { "day_of_week": 1, "start_time": "09:00", "end_time": "17:00", "is_available": true }
            ]
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "validation");
}

#[tokio::test]
async fn test_invalid_rule_is_rejected() {
    let server = server();
    let mentor_id = Uuid::new_v4();

    let response = server
        .put(&format!("/api/mentors/{mentor_id}/availability/rules"))
        .json(&json!({
            "timezone": "UTC",
            "rules": [
                { "day_of_week": 9, "start_time": "09:00", "end_time": "17:00", "is_available": true }
            ]
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_mentor_is_not_found() {
    let server = server();
    let mentor_id = Uuid::new_v4();

    let response = server
        .get(&format!("/api/mentors/{mentor_id}/availability"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "not_found");

    let response = server
        .put(&format!("/api/mentors/{mentor_id}/availability/overrides"))
        .json(&json!({ "date": "2026-03-09", "is_available": false }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolve_slots_projects_into_requested_timezone() {
    let server = server();
    let mentor_id = Uuid::new_v4();
    seed_profile(&server, mentor_id, "Asia/Ulaanbaatar").await;

    // 2026-03-09 is a Monday; local 09:00-17:00 is 01:00-09:00 UTC
    let response = server
        .get(&format!(
            "/api/mentors/{mentor_id}/slots?start=2026-03-09T00:00:00Z&end=2026-03-10T00:00:00Z"
        ))
        .await;
    response.assert_status(StatusCode::OK);

    let body = response.json::<Value>();
    assert_eq!(body["timezone"], "Asia/Ulaanbaatar");
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["start"], "2026-03-09T09:00:00+08:00");
    assert_eq!(slots[0]["end"], "2026-03-09T17:00:00+08:00");

    // viewer in UTC sees the same interval shifted
    let response = server
        .get(&format!(
            "/api/mentors/{mentor_id}/slots?start=2026-03-09T00:00:00Z&end=2026-03-10T00:00:00Z&timezone=UTC"
        ))
        .await;
    response.assert_status(StatusCode::OK);
    let body = response.json::<Value>();
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots[0]["start"], "2026-03-09T01:00:00+00:00");
}

#[tokio::test]
async fn test_date_override_blocks_slots() {
    let server = server();
    let mentor_id = Uuid::new_v4();
    seed_profile(&server, mentor_id, "UTC").await;

    let response = server
        .put(&format!("/api/mentors/{mentor_id}/availability/overrides"))
        .json(&json!({ "date": "2026-03-09", "is_available": false, "note": "travelling" }))
        .await;
    response.assert_status(StatusCode::OK);

    let response = server
        .get(&format!(
            "/api/mentors/{mentor_id}/slots?start=2026-03-09T00:00:00Z&end=2026-03-10T00:00:00Z"
        ))
        .await;
    response.assert_status(StatusCode::OK);
    assert!(response.json::<Value>()["slots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_inactive_profile_resolves_to_no_slots() {
    let server = server();
    let mentor_id = Uuid::new_v4();
    seed_profile(&server, mentor_id, "UTC").await;

    let response = server
        .put(&format!("/api/mentors/{mentor_id}/availability/active"))
        .json(&json!({ "is_active": false }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["is_active"], false);

    let response = server
        .get(&format!(
            "/api/mentors/{mentor_id}/slots?start=2026-03-09T00:00:00Z&end=2026-03-10T00:00:00Z"
        ))
        .await;
    response.assert_status(StatusCode::OK);
    assert!(response.json::<Value>()["slots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_resolve_slots_range_validation() {
    let server = server();
    let mentor_id = Uuid::new_v4();
    seed_profile(&server, mentor_id, "UTC").await;

    // inverted range
    let response = server
        .get(&format!(
            "/api/mentors/{mentor_id}/slots?start=2026-03-10T00:00:00Z&end=2026-03-09T00:00:00Z"
        ))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // longer than the resolution cap
    let response = server
        .get(&format!(
            "/api/mentors/{mentor_id}/slots?start=2026-01-01T00:00:00Z&end=2026-12-01T00:00:00Z"
        ))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // unknown viewer timezone
    let response = server
        .get(&format!(
            "/api/mentors/{mentor_id}/slots?start=2026-03-09T00:00:00Z&end=2026-03-10T00:00:00Z&timezone=Mars/Olympus"
        ))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
