mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use common::*;

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_unauthorized(pool: PgPool) {
    let app = build_test_app(pool);

    let res = send(&app, Method::GET, "/api/v1/questionnaires", None, None, None).await;
    expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_and_forged_tokens_are_unauthorized(pool: PgPool) {
    let app = build_test_app(pool);

    let res = send(
        &app,
        Method::GET,
        "/api/v1/courses/1",
        Some("not-a-jwt"),
        None,
        None,
    )
    .await;
    expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    let mut identity = test_config().identity;
    identity.secret = "some-other-secret-entirely-different".into();
    let forged = syllabus_api::auth::jwt::issue_token(LEARNER, "learner", "password", 3600, &identity)
        .unwrap();
    let res = get(&app, "/api/v1/courses/1", &forged).await;
    expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blocked_sign_in_provider_is_unauthorized(pool: PgPool) {
    let app = build_test_app(pool);
    let anonymous = token_with_provider(LEARNER, "learner", "anonymous");

    let res = get(&app, "/api/v1/courses/1", &anonymous).await;
    expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn learners_cannot_author(pool: PgPool) {
    let app = build_test_app(pool);

    let res = post_json(&app, "/api/v1/courses", &learner(), json!({"title": "Mine"})).await;
    expect_error(res, StatusCode::FORBIDDEN, "ACCESS_DENIED").await;

    let res = post_json(&app, "/api/v1/questionnaires", &learner(), quiz_body()).await;
    expect_error(res, StatusCode::FORBIDDEN, "ACCESS_DENIED").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_entities_are_not_found(pool: PgPool) {
    let app = build_test_app(pool);

    let res = get(&app, "/api/v1/courses/999", &learner()).await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let res = get(&app, "/api/v1/assignments/999/start", &learner()).await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let res = submit(&app, &learner(), 999, json!([])).await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_idempotency_key_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let token = instructor();
    let course_id = create_course(&app, &token).await;

    let res = post_json_with_key(
        &app,
        &format!("/api/v1/courses/{course_id}/enroll"),
        &learner(),
        &"k".repeat(300),
        json!({}),
    )
    .await;
    expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_course_title_is_a_validation_error(pool: PgPool) {
    let app = build_test_app(pool);

    let res = post_json(&app, "/api/v1/courses", &instructor(), json!({"title": ""})).await;
    expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR").await;
}
