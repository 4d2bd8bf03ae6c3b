//! Caller identity endpoint

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{CapabilitySet, Role};

use super::AuthenticatedUser;

/// The authenticated caller and what their role allows
#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Display label of the role
    pub role_label: String,
    pub capabilities: CapabilitySet,
}

/// Current user with derived capabilities
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(claims): AuthenticatedUser) -> Json<MeResponse> {
    let actor = claims.actor();
    Json(MeResponse {
        capabilities: actor.capabilities(),
        role_label: actor.role.label().to_string(),
        role: actor.role,
        id: actor.user_id,
        name: actor.identity,
    })
}
