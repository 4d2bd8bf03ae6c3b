//! Asset endpoints: inventory, scanning and lifecycle transitions

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{Asset, AssetInput, AssetQuery, ImportCandidate},
    services::assets::ScanOutcome,
};

use super::AuthenticatedUser;

/// Check-out request; `assigned_to` is honoured only for admins
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckOutRequest {
    pub assigned_to: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConditionRequest {
    pub broken: bool,
}

/// List assets visible to the caller
#[utoipa::path(
    get,
    path = "/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(AssetQuery),
    responses(
        (status = 200, description = "Visible assets", body = Vec<Asset>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_assets(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AssetQuery>,
) -> AppResult<Json<Vec<Asset>>> {
    let assets = state
        .services
        .assets
        .list(&claims.actor(), query.search.as_deref())
        .await?;
    Ok(Json(assets))
}

/// Get an asset by ID
#[utoipa::path(
    get,
    path = "/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset", body = Asset),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn get_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Asset>> {
    let asset = state.services.assets.get(&id).await?;
    Ok(Json(asset))
}

/// Resolve a scanned or typed code
#[utoipa::path(
    get,
    path = "/scan/{code}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Scanned asset code")),
    responses(
        (status = 200, description = "Existing asset, or a new id for admins", body = ScanOutcome),
        (status = 403, description = "Unknown code and caller cannot add assets")
    )
)]
pub async fn scan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<Json<ScanOutcome>> {
    let outcome = state.services.assets.lookup(&code, &claims.actor()).await?;
    Ok(Json(outcome))
}

/// Create an asset
#[utoipa::path(
    post,
    path = "/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    request_body = AssetInput,
    responses(
        (status = 201, description = "Asset created", body = Asset),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<AssetInput>,
) -> AppResult<(StatusCode, Json<Asset>)> {
    let asset = state.services.assets.save(input, None, &claims.actor()).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Update an asset; a different `id` in the body renames it
#[utoipa::path(
    put,
    path = "/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Current asset ID")),
    request_body = AssetInput,
    responses(
        (status = 200, description = "Asset updated", body = Asset),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "New ID already exists")
    )
)]
pub async fn update_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(input): Json<AssetInput>,
) -> AppResult<Json<Asset>> {
    let asset = state
        .services
        .assets
        .save(input, Some(&id), &claims.actor())
        .await?;
    Ok(Json(asset))
}

/// Delete an asset
#[utoipa::path(
    delete,
    path = "/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn delete_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.assets.delete(&id, &claims.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check an asset out
#[utoipa::path(
    post,
    path = "/assets/{id}/checkout",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Asset ID")),
    request_body = CheckOutRequest,
    responses(
        (status = 200, description = "Asset checked out", body = Asset),
        (status = 422, description = "Asset broken or already checked out")
    )
)]
pub async fn check_out(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    body: Option<Json<CheckOutRequest>>,
) -> AppResult<Json<Asset>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let asset = state
        .services
        .assets
        .check_out(&id, &claims.actor(), request.assigned_to.as_deref())
        .await?;
    Ok(Json(asset))
}

/// Return an asset
#[utoipa::path(
    post,
    path = "/assets/{id}/checkin",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset checked in", body = Asset),
        (status = 403, description = "Asset assigned to someone else"),
        (status = 422, description = "Asset is not checked out")
    )
)]
pub async fn check_in(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Asset>> {
    let asset = state.services.assets.check_in(&id, &claims.actor()).await?;
    Ok(Json(asset))
}

/// Report an asset broken or fixed
#[utoipa::path(
    put,
    path = "/assets/{id}/condition",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Asset ID")),
    request_body = ConditionRequest,
    responses(
        (status = 200, description = "Condition updated", body = Asset),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn set_condition(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<ConditionRequest>,
) -> AppResult<Json<Asset>> {
    let asset = state
        .services
        .assets
        .set_condition(&id, &claims.actor(), request.broken)
        .await?;
    Ok(Json(asset))
}

/// Prefilled copy of an asset under the next ID (not saved)
#[utoipa::path(
    post,
    path = "/assets/{id}/duplicate",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Source asset ID")),
    responses(
        (status = 200, description = "Candidate for the copy", body = ImportCandidate),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn duplicate_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ImportCandidate>> {
    let candidate = state.services.assets.duplicate(&id, &claims.actor()).await?;
    Ok(Json(candidate))
}
