//! Shared helpers for HTTP-level integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use hof_api::auth::jwt::{generate_access_token, JwtConfig};
use hof_api::config::{EngineConfig, ServerConfig};
use hof_api::router::build_app_router;
use hof_api::state::AppState;
use hof_core::roles::{ROLE_CREATOR, ROLE_MODERATOR};
use hof_core::types::DbId;
use hof_db::models::creator::CreateCreator;
use hof_db::models::screenshot::CreateScreenshot;
use hof_db::repositories::{CreatorRepo, ScreenshotRepo};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        engine: EngineConfig::default(),
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(AppState::new(pool, config.clone()), &config)
}

/// Build the router around a caller-held state, for tests that need to
/// reach into shared registries such as the merge locks.
pub fn build_test_app_with_state(pool: PgPool) -> (Router, AppState) {
    let config = test_config();
    let state = AppState::new(pool, config.clone());
    (build_app_router(state.clone(), &config), state)
}

pub fn creator_token(creator_id: DbId) -> String {
    generate_access_token(creator_id, ROLE_CREATOR, &test_config().jwt).unwrap()
}

pub fn moderator_token(creator_id: DbId) -> String {
    generate_access_token(creator_id, ROLE_MODERATOR, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None, None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn creator(pool: &PgPool, name: &str) -> DbId {
    CreatorRepo::create(
        pool,
        &CreateCreator {
            creator_name: name.to_string(),
            is_supporter: false,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn screenshot(pool: &PgPool, creator_id: DbId, embedding: Vec<f32>) -> DbId {
    ScreenshotRepo::create_with_embedding(
        pool,
        &CreateScreenshot {
            creator_id,
            city_name: "Harbor Heights".to_string(),
            city_milestone: 5,
            city_population: 48_000,
            showcased_mod_id: None,
            embedding,
            created_at: None,
        },
    )
    .await
    .unwrap()
    .id
}
