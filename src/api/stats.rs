//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::InventoryStats};

use super::AuthenticatedUser;

/// Dashboard counters; aggregates are only present for admins
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Inventory statistics", body = InventoryStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<InventoryStats>> {
    let stats = state.services.assets.stats(&claims.actor()).await?;
    Ok(Json(stats))
}
