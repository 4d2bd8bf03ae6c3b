//! User role management over HTTP

use assetdesk_server::models::Role;
use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::{app_with, send, token, user};

#[tokio::test]
async fn test_role_changes() {
    let app = app_with(
        Vec::new(),
        vec![user("ada", Role::Normal), user("root", Role::SuperAdmin)],
        None,
    );
    let root = token("Root", Role::SuperAdmin);

    let (status, body) = send(&app.router, Method::GET, "/api/v1/users", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/v1/users/ada/role",
        Some(&root),
        Some(json!({"role": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/v1/users/root/role",
        Some(&root),
        Some(json!({"role": "normal"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "You cannot change your own role.");
}

#[tokio::test]
async fn test_admins_cannot_manage_users() {
    let app = app_with(Vec::new(), vec![user("ada", Role::Normal)], None);
    let admin = token("Grace", Role::Admin);

    let (status, _) = send(&app.router, Method::GET, "/api/v1/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Method::PUT,
        "/api/v1/users/ada/role",
        Some(&admin),
        Some(json!({"role": "super_admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
