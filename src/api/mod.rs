//! API handlers for Libris REST endpoints

pub mod auth;
pub mod books;
pub mod borrows;
pub mod health;
pub mod members;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{access::Actor, book::Book, user::UserClaims},
    AppState,
};

/// Extractor for the authenticated caller: verified token claims plus the
/// actor with its role resolved for this request
pub struct AuthenticatedUser {
    pub claims: UserClaims,
    pub actor: Actor,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing or invalid authorization header".to_string()))?;

        let claims = UserClaims::from_token(bearer.token(), state.services.auth.jwt_secret())
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let actor = state.services.auth.actor_for(&claims).await?;
        Ok(AuthenticatedUser { claims, actor })
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(BookPage = PaginatedResponse<Book>)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

/// Routes served under `/api/v1`
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/me", get(auth::me))
        // Catalog
        .route("/books", get(books::list_books).post(books::borrow_from_catalog))
        .route("/books/add", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/edit", get(books::edit_book).post(books::update_book))
        .route("/books/:id/delete", get(books::delete_preview).post(books::delete_book))
        // Members
        .route("/members", get(members::list_members).post(members::create_member))
        .route("/members/:id", get(members::get_member))
        // Borrow ledger
        .route("/borrow/:book_id/:member_id", post(borrows::borrow_book))
        .route("/return/:borrow_id", post(borrows::return_book))
        .route("/logs", get(borrows::borrow_logs))
        .route("/my-borrows", get(borrows::my_borrows))
        // Users
        .route("/users/:id/role", put(users::set_role))
        .with_state(state)
}

/// Full application router: API, documentation and HTTP layers
pub fn router(state: AppState) -> Router {
    use tower_http::{
        compression::CompressionLayer,
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", routes(state))
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
