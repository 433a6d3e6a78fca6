//! Shared helpers for API integration tests.
//!
//! [`build_test_app`] runs the production router and middleware stack
//! against the per-test database that `#[sqlx::test]` provides.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use syllabus_api::auth::jwt::{issue_token, IdentityConfig};
use syllabus_api::config::ServerConfig;
use syllabus_api::router::build_app_router;
use syllabus_api::state::AppState;
use syllabus_events::EventBus;
use tower::ServiceExt;

pub const INSTRUCTOR: &str = "instructor-1";
pub const OTHER_INSTRUCTOR: &str = "instructor-2";
pub const LEARNER: &str = "learner-1";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 5,
        identity: IdentityConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: None,
            blocked_providers: vec!["anonymous".to_string()],
        },
    }
}

pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
    };
    build_app_router(state, &config)
}

/// A signed token for `uid` with a password sign-in.
pub fn token(uid: &str, role: &str) -> String {
    token_with_provider(uid, role, "password")
}

pub fn token_with_provider(uid: &str, role: &str, provider: &str) -> String {
    issue_token(uid, role, provider, 3600, &test_config().identity).expect("token should sign")
}

pub fn instructor() -> String {
    token(INSTRUCTOR, "instructor")
}

pub fn learner() -> String {
    token(LEARNER, "learner")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    idempotency_key: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if let Some(key) = idempotency_key {
        builder = builder.header("idempotency-key", key);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None, None).await
}

pub async fn post_json(app: &Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(token), None, Some(body)).await
}

pub async fn post_json_with_key(
    app: &Router,
    uri: &str,
    token: &str,
    key: &str,
    body: Value,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(key), Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(token), None, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::PATCH, uri, Some(token), None, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None, None).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the `data` envelope contents.
pub async fn expect_data(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await["data"].clone()
}

/// Assert the status and error code of a failed request.
pub async fn expect_error(response: Response, status: StatusCode, code: &str) -> Value {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["code"], code, "unexpected error body: {body}");
    body
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_course(app: &Router, token: &str) -> i64 {
    let res = post_json(app, "/api/v1/courses", token, json!({"title": "Intro to Rust"})).await;
    expect_data(res, StatusCode::CREATED).await["id"]
        .as_i64()
        .unwrap()
}

pub async fn create_module(app: &Router, token: &str, course_id: i64) -> i64 {
    let res = post_json(
        app,
        &format!("/api/v1/courses/{course_id}/modules"),
        token,
        json!({"title": "Ownership"}),
    )
    .await;
    expect_data(res, StatusCode::CREATED).await["id"]
        .as_i64()
        .unwrap()
}

/// Two single-choice questions worth 1 point each. Correct answers are
/// `q1 = "b"` and `q2 = "a"`.
pub fn quiz_body() -> Value {
    json!({
        "title": "Ownership check",
        "purpose": "quiz",
        "questions": [
            {
                "id": "q1",
                "type": "single",
                "prompt": "Which moves?",
                "options": [{"id": "a", "label": "Copy"}, {"id": "b", "label": "String"}],
                "required": true,
                "correct": ["b"]
            },
            {
                "id": "q2",
                "type": "single",
                "prompt": "Which borrows?",
                "options": [{"id": "a", "label": "&T"}, {"id": "b", "label": "T"}],
                "correct": ["a"]
            }
        ]
    })
}

/// A survey without answer keys: submissions are never scored.
pub fn survey_body() -> Value {
    json!({
        "title": "How confident are you?",
        "purpose": "survey",
        "questions": [
            {
                "id": "confidence",
                "type": "scale",
                "prompt": "Rate yourself",
                "scale": {"min": 1, "max": 5},
                "required": true
            }
        ]
    })
}

pub async fn create_template(app: &Router, token: &str, body: Value) -> Value {
    let res = post_json(app, "/api/v1/questionnaires", token, body).await;
    expect_data(res, StatusCode::CREATED).await
}

pub async fn create_assignment(
    app: &Router,
    token: &str,
    questionnaire_id: i64,
    scope: Value,
    timing: &str,
) -> Value {
    let res = post_json(
        app,
        "/api/v1/assignments",
        token,
        json!({
            "questionnaire_id": questionnaire_id,
            "scope": scope,
            "timing": timing,
        }),
    )
    .await;
    expect_data(res, StatusCode::CREATED).await
}

pub async fn submit(app: &Router, token: &str, assignment_id: i64, answers: Value) -> Response {
    post_json(
        app,
        &format!("/api/v1/assignments/{assignment_id}/submit"),
        token,
        json!({"answers": answers}),
    )
    .await
}
