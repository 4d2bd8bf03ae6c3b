//! User management endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{UpdateRole, User},
};

use super::AuthenticatedUser;

/// List users (super admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users", body = Vec<User>),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    let users = state.services.users.list(&claims.actor()).await?;
    Ok(Json(users))
}

/// Change a user's role (super admin only, not one's own)
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 403, description = "Insufficient rights"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Cannot change own role")
    )
)]
pub async fn update_role(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(data): Json<UpdateRole>,
) -> AppResult<Json<User>> {
    let user = state
        .services
        .users
        .update_role(&claims.actor(), &id, data.role)
        .await?;
    Ok(Json(user))
}
