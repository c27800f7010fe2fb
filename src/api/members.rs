//! Member management endpoints (librarians only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        access::Requirement,
        member::{CreateMember, Member},
    },
    AppState,
};

use super::AuthenticatedUser;

/// List members
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Members ordered by name", body = Vec<Member>),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<Member>>> {
    auth.actor.require(Requirement::Librarian)?;
    Ok(Json(state.services.members.list().await?))
}

/// Create a member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid fields or duplicate email", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<CreateMember>,
) -> AppResult<(StatusCode, Json<Member>)> {
    auth.actor.require(Requirement::Librarian)?;

    let member = state.services.members.create(request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Get a member
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member", body = Member),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Member>> {
    auth.actor.require(Requirement::Librarian)?;
    Ok(Json(state.services.members.get(id).await?))
}
