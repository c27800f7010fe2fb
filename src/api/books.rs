//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        access::Requirement,
        book::{Book, BookDeletePreview, BookInput, BookQuery},
        borrow::{BorrowDetails, CatalogBorrowRequest},
    },
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Result of a catalog borrow
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub message: String,
    pub borrow: BorrowDetails,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

/// List the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Books ordered by title", body = crate::api::BookPage),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let (books, total) = state.services.catalog.search(&query).await?;

    Ok(Json(PaginatedResponse {
        items: books,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}

/// Borrow a book from the catalog page
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CatalogBorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowResponse),
        (status = 400, description = "Member is not active", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or member not found", body = crate::error::ErrorResponse),
        (status = 409, description = "No copy available", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_from_catalog(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<CatalogBorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let borrow = state
        .services
        .ledger
        .borrow_from_catalog(&auth.actor, request.book_id, request.member_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            message: format!("Book borrowed successfully by {}.", borrow.member_name),
            borrow,
        }),
    ))
}

/// Get a book
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    Ok(Json(state.services.catalog.get(id).await?))
}

/// Add a book
#[utoipa::path(
    post,
    path = "/books/add",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid fields or duplicate ISBN", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(input): Json<BookInput>,
) -> AppResult<(StatusCode, Json<Book>)> {
    auth.actor.require(Requirement::Librarian)?;

    let book = state.services.catalog.create(input, auth.actor.user_id).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Read a book for editing
#[utoipa::path(
    get,
    path = "/books/{id}/edit",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn edit_book(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    auth.actor.require(Requirement::Librarian)?;
    Ok(Json(state.services.catalog.get(id).await?))
}

/// Update a book
#[utoipa::path(
    post,
    path = "/books/{id}/edit",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid fields or duplicate ISBN", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<BookInput>,
) -> AppResult<Json<Book>> {
    auth.actor.require(Requirement::Librarian)?;
    Ok(Json(state.services.catalog.update(id, input).await?))
}

/// Delete confirmation: the book and its outstanding borrows
#[utoipa::path(
    get,
    path = "/books/{id}/delete",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book and outstanding borrow count", body = BookDeletePreview),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_preview(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDeletePreview>> {
    auth.actor.require(Requirement::Librarian)?;
    Ok(Json(state.services.catalog.delete_preview(id).await?))
}

/// Delete a book and its borrow records
#[utoipa::path(
    post,
    path = "/books/{id}/delete",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = DeleteResponse),
        (status = 403, description = "Librarian only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DeleteResponse>> {
    auth.actor.require(Requirement::Librarian)?;
    state.services.catalog.delete(id).await?;
    Ok(Json(DeleteResponse {
        message: "Book deleted successfully.".to_string(),
    }))
}
