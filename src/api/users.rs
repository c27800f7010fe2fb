//! User role management

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{access::Requirement, role::Role, user::UpdateRole},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct RoleResponse {
    pub user_id: i32,
    pub username: String,
    /// Role after the change, profile included
    pub role: Role,
}

/// Assign a role to a user
#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_role(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateRole>,
) -> AppResult<Json<RoleResponse>> {
    auth.actor.require(Requirement::Librarian)?;

    let (user, role) = state.services.auth.set_role(id, request.role).await?;
    Ok(Json(RoleResponse {
        user_id: user.id,
        username: user.username,
        role,
    }))
}
