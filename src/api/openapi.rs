//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, borrows, health, members, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.1.0",
        description = "Small library management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::register,
        auth::me,
        // Books
        books::list_books,
        books::borrow_from_catalog,
        books::get_book,
        books::create_book,
        books::edit_book,
        books::update_book,
        books::delete_preview,
        books::delete_book,
        // Members
        members::list_members,
        members::create_member,
        members::get_member,
        // Borrows
        borrows::borrow_book,
        borrows::return_book,
        borrows::borrow_logs,
        borrows::my_borrows,
        // Users
        users::set_role,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            auth::RegisterResponse,
            auth::LogoutResponse,
            crate::models::user::RegisterUser,
            crate::models::role::Role,
            // Books
            crate::models::book::Book,
            crate::models::book::BookInput,
            crate::models::book::BookDeletePreview,
            crate::api::BookPage,
            books::BorrowResponse,
            books::DeleteResponse,
            // Members
            crate::models::member::Member,
            crate::models::member::CreateMember,
            // Borrows
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::BorrowFilter,
            crate::models::borrow::ReturnStatus,
            crate::models::borrow::CatalogBorrowRequest,
            borrows::ReturnResponse,
            borrows::BorrowLogResponse,
            borrows::MyBorrowsResponse,
            // Users
            crate::models::user::UpdateRole,
            users::RoleResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, logout and registration"),
        (name = "books", description = "Catalog management"),
        (name = "members", description = "Member management"),
        (name = "borrows", description = "Borrowing and returning books"),
        (name = "users", description = "Role assignment")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
