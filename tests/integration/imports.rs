//! Bulk import over HTTP

use assetdesk_server::{
    models::{Asset, Role},
    repository::AssetStore,
};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::common::{app, app_with, client, send, send_csv, token};

fn candidates(n: usize) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| json!({"id": format!("IMP-{:03}", i), "name": "Imported"}))
        .collect();
    Value::Array(items)
}

#[tokio::test]
async fn test_json_import_requires_inventory_rights() {
    let app = app(Vec::new());

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/imports",
        Some(&token("Ada", Role::Normal)),
        Some(json!({"candidates": candidates(2)})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.assets.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_json_import_truncates_and_overwrites() {
    let app = app(vec![Asset::new("IMP-000", "Old name")]);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/imports",
        Some(&token("Grace", Role::Admin)),
        Some(json!({"candidates": candidates(500)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], 500);
    assert_eq!(body["persisted"], 450);
    assert_eq!(body["dropped"], 50);
    assert_eq!(body["truncated"], true);
    assert_eq!(body["dropped_ids"].as_array().unwrap().len(), 50);

    assert_eq!(app.stored_asset("IMP-000").await.name, "Imported");
}

#[tokio::test]
async fn test_csv_import_with_enrichment() {
    let app = app_with(Vec::new(), Vec::new(), Some(client(None)));
    let csv = "id,name,category\nLP-001,Laptop,Computers\nDR-1,Drill,\n,No id\n";

    let (status, body) = send_csv(&app.router, "/api/v1/imports/csv?enrich=true", &token("Grace", Role::Admin), csv).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], 2);
    assert_eq!(body["enriched"], 2);
    assert_eq!(body["persisted"], 2);

    let laptop = app.stored_asset("LP-001").await;
    assert_eq!(laptop.category.as_deref(), Some("Computers"));
    assert_eq!(laptop.maintenance_note.as_deref(), Some("Inspect yearly"));

    let drill = app.stored_asset("DR-1").await;
    assert_eq!(drill.category.as_deref(), Some("Tools"));
}

#[tokio::test]
async fn test_csv_rows_without_name_are_skipped() {
    let app = app(Vec::new());
    let csv = "id,name\nPR-1,Projector\nPR-2,\nPR-3,  \n";

    let (status, body) = send_csv(&app.router, "/api/v1/imports/csv", &token("Grace", Role::Admin), csv).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], 3);
    assert_eq!(body["persisted"], 1);
    assert_eq!(body["skipped"], 2);
    assert_eq!(body["skipped_ids"], json!(["PR-2", "PR-3"]));
    assert!(app.assets.get("PR-2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_csv_without_required_columns() {
    let app = app(Vec::new());

    let (status, body) = send_csv(&app.router, "/api/v1/imports/csv", &token("Grace", Role::Admin), "code,title\n1,x\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "CSV must contain \"id\" and \"name\" columns.");
}

#[tokio::test]
async fn test_misconfigured_endpoint_still_imports() {
    let app = app_with(Vec::new(), Vec::new(), Some(client(Some(405))));

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/imports",
        Some(&token("Grace", Role::Admin)),
        Some(json!({"candidates": candidates(12), "enrich": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persisted"], 12);
    assert_eq!(body["enriched"], 0);
    assert_eq!(body["enrichment_aborted"], true);
    assert_eq!(body["failures"].as_array().unwrap().len(), 1);
    assert_eq!(body["failures"][0]["permanent"], true);
}

#[tokio::test]
async fn test_enrichment_requested_without_endpoint() {
    let app = app(Vec::new());

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/imports",
        Some(&token("Grace", Role::Admin)),
        Some(json!({"candidates": candidates(3), "enrich": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persisted"], 3);
    assert_eq!(body["failures"][0]["message"], "AI enrichment is not configured");
}
