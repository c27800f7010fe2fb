//! Router tests that need neither PostgreSQL nor Redis: the pool connects
//! lazily and these requests are answered before any query runs.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use libris_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{redis::RedisService, Services},
    AppState,
};

fn app() -> Router {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    let redis = RedisService::open(&config.redis.url).unwrap();
    let services = Services::new(Repository::new(pool), config.auth.clone(), redis);

    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_rejected_with_login_redirect() {
    for uri in ["/api/v1/books", "/api/v1/logs", "/api/v1/my-borrows", "/api/v1/me"] {
        let response = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body = body_json(response).await;
        assert_eq!(body["redirect"], "/login");
        assert_eq!(body["error"], "NotAuthenticated");
    }
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/return/1")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_reports_invalid_fields() {
    let payload = json!({
        "username": "ab",
        "first_name": "",
        "last_name": "Reader",
        "email": "not-an-email",
        "password": "short",
        "password_confirm": "different"
    });
    let response = app()
        .oneshot(
            Request::post("/api/v1/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let fields = body["fields"].as_object().unwrap();
    for field in ["username", "first_name", "email", "password", "password_confirm"] {
        assert!(fields.contains_key(field), "missing {}", field);
    }
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let response = app()
        .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let paths = body["paths"].as_object().unwrap();
    for path in ["/books", "/borrow/{book_id}/{member_id}", "/return/{borrow_id}", "/logs"] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
}
