//! Authentication endpoints: login, logout, registration, current user

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        member::Member,
        role::Role,
        user::{RegisterUser, User},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response with JWT token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Current user with role and landing page
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    /// Where the user lands after login
    pub home: String,
}

impl UserInfo {
    fn new(user: User, role: Role) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role,
            home: role.home_path().to_string(),
        }
    }
}

/// Registration response
#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserInfo,
    pub member: Member,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
    /// Where a front end should go next
    pub redirect: String,
}

/// Authenticate and obtain a token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user, role) = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.jwt_expiration_hours as i64 * 3600,
        user: UserInfo::new(user, role),
    }))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<LogoutResponse>> {
    state.services.auth.logout(&auth.claims).await?;
    Ok(Json(LogoutResponse {
        message: "You have been logged out.".to_string(),
        redirect: "/login".to_string(),
    }))
}

/// Create an account with its member profile
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid or duplicate fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let (user, member) = state.services.auth.register(request).await?;
    let role = state.services.auth.role_of(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserInfo::new(user, role),
            member,
            message: "Registration successful. Please log in.".to_string(),
        }),
    ))
}

/// Current user info
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.auth.get_user(auth.actor.user_id).await?;
    Ok(Json(UserInfo::new(user, auth.actor.role)))
}
