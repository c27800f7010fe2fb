//! Borrow ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        borrow::{BorrowDetails, BorrowFilter, BorrowLogQuery, ReturnStatus},
        member::Member,
    },
    AppState,
};

use super::{books::BorrowResponse, AuthenticatedUser};

/// Return response with borrow details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: ReturnStatus,
    pub message: String,
    pub borrow: BorrowDetails,
}

/// Filtered borrow log
#[derive(Serialize, ToSchema)]
pub struct BorrowLogResponse {
    pub filter: BorrowFilter,
    pub borrows: Vec<BorrowDetails>,
}

/// The caller's profile and borrows
#[derive(Serialize, ToSchema)]
pub struct MyBorrowsResponse {
    pub member: Member,
    pub borrows: Vec<BorrowDetails>,
}

/// Lend a book to a member
#[utoipa::path(
    post,
    path = "/borrow/{book_id}/{member_id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i32, Path, description = "Book ID"),
        ("member_id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 201, description = "Borrow recorded", body = BorrowResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or member not found", body = crate::error::ErrorResponse),
        (status = 409, description = "No copy available", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((book_id, member_id)): Path<(i32, i32)>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let borrow = state.services.ledger.borrow(&auth.actor, book_id, member_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            message: format!("Book borrowed successfully by {}.", borrow.member_name),
            borrow,
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/return/{borrow_id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("borrow_id" = i32, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Returned, or already returned", body = ReturnResponse),
        (status = 403, description = "Not your borrow", body = crate::error::ErrorResponse),
        (status = 404, description = "Borrow not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(borrow_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let (borrow, status) = state.services.ledger.return_borrow(&auth.actor, borrow_id).await?;

    let message = match status {
        ReturnStatus::Returned => "Book returned successfully.",
        ReturnStatus::AlreadyReturned => "This book has already been returned.",
    };
    Ok(Json(ReturnResponse {
        status,
        message: message.to_string(),
        borrow,
    }))
}

/// Borrow log
#[utoipa::path(
    get,
    path = "/logs",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(BorrowLogQuery),
    responses(
        (status = 200, description = "Borrows, newest first", body = BorrowLogResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_logs(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<BorrowLogQuery>,
) -> AppResult<Json<BorrowLogResponse>> {
    let filter = BorrowFilter::parse(query.filter.as_deref());
    let borrows = state.services.ledger.logs(&auth.actor, filter).await?;
    Ok(Json(BorrowLogResponse { filter, borrows }))
}

/// Own borrow history; librarians are sent to the log
#[utoipa::path(
    get,
    path = "/my-borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile and borrows", body = MyBorrowsResponse),
        (status = 303, description = "Librarians are redirected to the log"),
        (status = 400, description = "Profile email already taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_borrows(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Response> {
    if auth.actor.is_librarian() {
        return Ok(Redirect::to("/api/v1/logs").into_response());
    }

    let (member, borrows) = state.services.ledger.my_borrows(&auth.actor).await?;
    Ok(Json(MyBorrowsResponse { member, borrows }).into_response())
}
