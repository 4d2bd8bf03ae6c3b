//! Shared fixtures for the integration tests

use std::sync::Arc;
use std::time::Duration;

use assetdesk_server::{
    api,
    config::AppConfig,
    models::{Asset, Role, User, UserClaims},
    repository::{
        memory::{MemoryAssetStore, MemoryUserStore},
        AssetStore, Repository,
    },
    services::{
        enrichment::{CompletionRequest, CompletionTransport, EnrichmentClient, ServiceFailure},
        retry::RetryPolicy,
        Services,
    },
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub assets: Arc<MemoryAssetStore>,
}

impl TestApp {
    pub async fn stored_asset(&self, id: &str) -> Asset {
        self.assets.get(id).await.unwrap().unwrap()
    }
}

pub fn config() -> AppConfig {
    AppConfig {
        server: Default::default(),
        database: Default::default(),
        storage: Default::default(),
        auth: assetdesk_server::config::AuthConfig {
            jwt_secret: SECRET.to_string(),
        },
        logging: Default::default(),
        enrichment: Default::default(),
        import: Default::default(),
        lifecycle: Default::default(),
    }
}

pub fn app(assets: Vec<Asset>) -> TestApp {
    app_with(assets, Vec::new(), None)
}

pub fn app_with(assets: Vec<Asset>, users: Vec<User>, client: Option<EnrichmentClient>) -> TestApp {
    let asset_store = Arc::new(MemoryAssetStore::with_assets(assets));
    let repository = Repository::with_stores(
        asset_store.clone(),
        Arc::new(MemoryUserStore::with_users(users)),
    );

    let config = config();
    let services = Services::with_client(repository, &config, client);
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        shutdown: CancellationToken::new(),
    };

    TestApp {
        router: api::create_router(state),
        assets: asset_store,
    }
}

/// Bearer token for a user whose id is the lowercased name
pub fn token(name: &str, role: Role) -> String {
    let now = chrono::Utc::now().timestamp();
    UserClaims {
        sub: name.to_lowercase(),
        name: name.to_string(),
        role: role.as_str().to_string(),
        exp: now + 3600,
        iat: now,
    }
    .create_token(SECRET)
    .unwrap()
}

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: id.to_string(),
        email: None,
        employee_id: None,
        role,
        last_updated: chrono::Utc::now(),
    }
}

pub fn checked_out(id: &str, holder: &str) -> Asset {
    let mut asset = Asset::new(id, "Laptop");
    asset.status = assetdesk_server::models::AssetStatus::CheckedOut;
    asset.assigned_to = Some(holder.to_string());
    asset
}

async fn dispatch(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    dispatch(router, request).await
}

pub async fn send_csv(router: &Router, uri: &str, token: &str, csv: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap();
    dispatch(router, request).await
}

/// Completion endpoint double: enriches every id in the prompt, or fails
/// every call with `fail_status`.
pub struct FakeTransport {
    pub fail_status: Option<u16>,
}

#[async_trait]
impl CompletionTransport for FakeTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<Value, ServiceFailure> {
        if let Some(status) = self.fail_status {
            return Err(ServiceFailure::from_status(status, "Method Not Allowed"));
        }

        let prompt = &request.messages.last().unwrap().content;
        let items: Vec<Value> = serde_json::from_str(prompt.split("Items: ").nth(1).unwrap()).unwrap();
        let mut results = serde_json::Map::new();
        for item in items {
            results.insert(
                item["id"].as_str().unwrap().to_string(),
                json!({"category": "Tools", "description": "Generated", "maintenance": "Inspect yearly"}),
            );
        }
        Ok(json!({"choices": [{"message": {"content": Value::Object(results).to_string()}}]}))
    }
}

pub fn client(fail_status: Option<u16>) -> EnrichmentClient {
    EnrichmentClient::new(Arc::new(FakeTransport { fail_status }), "fake-model").with_policy(RetryPolicy::new(
        3,
        Duration::from_millis(1),
        2,
        ServiceFailure::is_permanent,
    ))
}
