//! Bulk import endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    import,
    models::{ImportCandidate, ImportReport},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportRequest {
    pub candidates: Vec<ImportCandidate>,
    /// Fill missing category/description/maintenance through the AI service
    #[serde(default)]
    pub enrich: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CsvImportQuery {
    #[serde(default)]
    pub enrich: bool,
}

/// Import candidate records
#[utoipa::path(
    post,
    path = "/imports",
    tag = "imports",
    security(("bearer_auth" = [])),
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn import_json(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ImportRequest>,
) -> AppResult<Json<ImportReport>> {
    claims.actor().require_manage_inventory()?;

    let candidates = request
        .candidates
        .into_iter()
        .map(|mut c| {
            c.id = c.id.trim().to_string();
            c
        })
        .filter(|c| !c.id.is_empty())
        .collect();

    run_import(&state, candidates, request.enrich).await
}

/// Import a CSV file sent as the raw request body
#[utoipa::path(
    post,
    path = "/imports/csv",
    tag = "imports",
    security(("bearer_auth" = [])),
    params(CsvImportQuery),
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing id/name columns"),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn import_csv(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<CsvImportQuery>,
    body: String,
) -> AppResult<Json<ImportReport>> {
    claims.actor().require_manage_inventory()?;

    let candidates = import::parse_candidates(&body)?;
    run_import(&state, candidates, query.enrich).await
}

async fn run_import(state: &AppState, candidates: Vec<ImportCandidate>, enrich: bool) -> AppResult<Json<ImportReport>> {
    let progress = |batch_index: usize, total_batches: usize| {
        tracing::debug!(batch_index, total_batches, "Enriching batch");
    };
    let cancel = state.shutdown.child_token();

    let report = state
        .services
        .imports
        .run(candidates, enrich, &progress, &cancel)
        .await?;
    Ok(Json(report))
}
