//! AI assistant endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::EnrichmentResult,
    services::assistant::{AskRequest, AskResponse, SuggestRequest},
};

use super::AuthenticatedUser;

/// Suggest category, description and maintenance for an asset name
#[utoipa::path(
    post,
    path = "/assistant/suggest",
    tag = "assistant",
    security(("bearer_auth" = [])),
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Suggested details", body = EnrichmentResult),
        (status = 502, description = "AI service failure")
    )
)]
pub async fn suggest(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SuggestRequest>,
) -> AppResult<Json<EnrichmentResult>> {
    claims.actor().require_manage_inventory()?;

    let result = state.services.assistant.suggest_details(&request.name).await?;
    Ok(Json(result))
}

/// Ask a question about the assets visible to the caller
#[utoipa::path(
    post,
    path = "/assistant/ask",
    tag = "assistant",
    security(("bearer_auth" = [])),
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer", body = AskResponse),
        (status = 502, description = "AI service failure")
    )
)]
pub async fn ask(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<AskRequest>,
) -> AppResult<Json<AskResponse>> {
    let inventory = state.services.assets.list(&claims.actor(), None).await?;
    let answer = state.services.assistant.ask(&request.question, &inventory).await?;
    Ok(Json(AskResponse { answer }))
}
