//! Asset lifecycle over HTTP

use assetdesk_server::models::{Asset, Condition, Role};
use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::{app, checked_out, send, token};

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app(Vec::new());

    let (status, body) = send(&app.router, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app.router, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["enrichment_enabled"], false);
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = app(Vec::new());

    let (status, body) = send(&app.router, Method::GET, "/api/v1/assets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");

    let (status, _) = send(&app.router, Method::GET, "/api/v1/assets", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_reports_capabilities() {
    let app = app(Vec::new());
    let root = token("Root", Role::SuperAdmin);

    let (status, body) = send(&app.router, Method::GET, "/api/v1/auth/me", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "super_admin");
    assert_eq!(body["role_label"], "Super Admin");
    assert_eq!(body["capabilities"]["manage_users"], true);
}

#[tokio::test]
async fn test_check_out_and_in_by_owner() {
    let app = app(vec![Asset::new("LP-001", "Laptop")]);
    let ada = token("Ada", Role::Normal);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/assets/LP-001/checkout",
        Some(&ada),
        Some(json!({"assigned_to": "Mallory"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "checked_out");
    assert_eq!(body["assigned_to"], "Ada");

    let (status, body) = send(&app.router, Method::POST, "/api/v1/assets/LP-001/checkin", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "available");
    assert!(body["assigned_to"].is_null());
}

#[tokio::test]
async fn test_admin_checks_out_on_behalf_of_others() {
    let app = app(vec![Asset::new("LP-001", "Laptop")]);
    let admin = token("Grace", Role::Admin);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/assets/LP-001/checkout",
        Some(&admin),
        Some(json!({"assigned_to": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_to"], "Ada");
}

#[tokio::test]
async fn test_check_in_of_someone_elses_item() {
    let app = app(vec![checked_out("LP-001", "Ada")]);
    let bob = token("Bob", Role::Normal);

    let (status, body) = send(&app.router, Method::POST, "/api/v1/assets/LP-001/checkin", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only check in items assigned to you.");

    let stored = app.stored_asset("LP-001").await;
    assert_eq!(stored.assigned_to.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_broken_asset_cannot_be_checked_out() {
    let mut drill = Asset::new("DR-1", "Drill");
    drill.condition = Condition::Broken;
    let app = app(vec![drill]);
    let admin = token("Grace", Role::Admin);

    let (status, body) = send(&app.router, Method::POST, "/api/v1/assets/DR-1/checkout", Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Item is unavailable: under repair");
}

#[tokio::test]
async fn test_condition_changes_need_inventory_rights() {
    let app = app(vec![Asset::new("DR-1", "Drill")]);

    let (status, _) = send(
        &app.router,
        Method::PUT,
        "/api/v1/assets/DR-1/condition",
        Some(&token("Ada", Role::Normal)),
        Some(json!({"broken": true})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/v1/assets/DR-1/condition",
        Some(&token("Grace", Role::Admin)),
        Some(json!({"broken": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["condition"], "broken");
}

#[tokio::test]
async fn test_scan_unknown_code() {
    let app = app(Vec::new());

    let (status, body) = send(&app.router, Method::GET, "/api/v1/scan/NEW-1", Some(&token("Ada", Role::Normal)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Item not found in inventory. You do not have permission to add new assets."
    );

    let (status, body) = send(&app.router, Method::GET, "/api/v1/scan/NEW-1", Some(&token("Grace", Role::Admin)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "new");
    assert_eq!(body["id"], "NEW-1");
}

#[tokio::test]
async fn test_create_update_and_delete() {
    let app = app(Vec::new());
    let admin = token("Grace", Role::Admin);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/assets",
        Some(&admin),
        Some(json!({"id": "CAM-01", "name": "Camera", "category": "Video"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "available");

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/v1/assets/CAM-01",
        Some(&admin),
        Some(json!({"id": "CAM-02", "name": "Camera"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "CAM-02");
    assert_eq!(body["category"], "Video");

    let (status, _) = send(&app.router, Method::GET, "/api/v1/assets/CAM-01", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app.router, Method::DELETE, "/api/v1/assets/CAM-02", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_rename_onto_existing_id_conflicts() {
    let app = app(vec![Asset::new("A", "First"), Asset::new("B", "Second")]);
    let admin = token("Grace", Role::Admin);

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/v1/assets/A",
        Some(&admin),
        Some(json!({"id": "B", "name": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    assert_eq!(app.stored_asset("A").await.name, "First");
    assert_eq!(app.stored_asset("B").await.name, "Second");
}

#[tokio::test]
async fn test_duplicate_suggests_next_id() {
    let app = app(vec![checked_out("LP-001", "Ada")]);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/assets/LP-001/duplicate",
        Some(&token("Grace", Role::Admin)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "LP-002");
    assert_eq!(body["name"], "Laptop");
}

#[tokio::test]
async fn test_list_and_stats_scoped_by_role() {
    let app = app(vec![
        checked_out("LP-001", "Ada"),
        checked_out("LP-002", "Bob"),
        Asset::new("LP-003", "Monitor"),
    ]);
    let ada = token("Ada", Role::Normal);
    let admin = token("Grace", Role::Admin);

    let (_, body) = send(&app.router, Method::GET, "/api/v1/assets", Some(&ada), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app.router, Method::GET, "/api/v1/assets?search=monitor", Some(&admin), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app.router, Method::GET, "/api/v1/stats", Some(&ada), None).await;
    assert_eq!(body["mine"], 1);
    assert!(body.get("total").is_none());

    let (_, body) = send(&app.router, Method::GET, "/api/v1/stats", Some(&admin), None).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["checked_out"], 2);
    assert_eq!(body["available"], 1);
}

#[tokio::test]
async fn test_assistant_without_endpoint() {
    let app = app(Vec::new());

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/assistant/ask",
        Some(&token("Ada", Role::Normal)),
        Some(json!({"question": "What do I have?"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "AI service is not configured");
}
