mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::task::JoinSet;

use common::*;

async fn enroll(app: &Router, token: &str, course_id: i64) -> Value {
    let res = post_json(app, &format!("/api/v1/courses/{course_id}/enroll"), token, json!({})).await;
    assert!(res.status().is_success());
    body_json(res).await["data"].clone()
}

async fn complete(app: &Router, token: &str, course_id: i64, module_id: i64) -> axum::response::Response {
    post_json(
        app,
        &format!("/api/v1/courses/{course_id}/modules/{module_id}/complete"),
        token,
        json!({}),
    )
    .await
}

async fn access(app: &Router, token: &str, course_id: i64, module_id: Option<i64>) -> Value {
    let uri = match module_id {
        Some(m) => format!("/api/v1/courses/{course_id}/access?module_id={m}"),
        None => format!("/api/v1/courses/{course_id}/access"),
    };
    expect_data(get(app, &uri, token).await, StatusCode::OK).await
}

async fn course_completion_count(app: &Router, course_id: i64) -> i64 {
    let res = get(app, &format!("/api/v1/courses/{course_id}"), &learner()).await;
    expect_data(res, StatusCode::OK).await["completion_count"]
        .as_i64()
        .unwrap()
}

async fn quiz_assignment(app: &Router, scope: Value, timing: &str) -> i64 {
    let token = instructor();
    let questionnaire_id = create_template(app, &token, quiz_body()).await["id"]
        .as_i64()
        .unwrap();
    create_assignment(app, &token, questionnaire_id, scope, timing).await["id"]
        .as_i64()
        .unwrap()
}

async fn module_flags(pool: &PgPool, module_id: i64) -> Option<(bool, bool)> {
    sqlx::query_as(
        "SELECT pre_module_complete, post_module_complete FROM progress \
         WHERE uid = $1 AND module_id = $2",
    )
    .bind(LEARNER)
    .bind(module_id)
    .fetch_optional(pool)
    .await
    .unwrap()
}

fn correct_answers() -> Value {
    json!([
        {"question_id": "q1", "value": "b"},
        {"question_id": "q2", "value": "a"}
    ])
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enrollment_is_created_once(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;

    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    let uri = format!("/api/v1/courses/{course_id}/enroll");
    let first = post_json(&app, &uri, &learner(), json!({})).await;
    let first = expect_data(first, StatusCode::CREATED).await;
    assert_eq!(first["uid"], LEARNER);
    assert_eq!(first["completed_count"], 0);

    let again = post_json(&app, &uri, &learner(), json!({})).await;
    let again = expect_data(again, StatusCode::OK).await;
    assert_eq!(again["id"], first["id"]);

    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["id"], first["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pre_course_gate_opens_after_submission(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let module_id = create_module(&app, &instructor(), course_id).await;
    let gate_id = quiz_assignment(&app, json!({"type": "course", "course_id": course_id}), "pre").await;

    let decision = access(&app, &learner(), course_id, None).await;
    assert_eq!(decision["allowed"], false);
    assert_eq!(decision["blocking"][0]["id"], gate_id);
    assert!(decision["blocking"][0].get("questions").is_none());

    // Course gates also guard every module.
    let decision = access(&app, &learner(), course_id, Some(module_id)).await;
    assert_eq!(decision["allowed"], false);

    // A wrong answer still completes the questionnaire.
    let res = submit(&app, &learner(), gate_id, json!([{"question_id": "q1", "value": "a"}])).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["is_complete"], true);

    let decision = access(&app, &learner(), course_id, None).await;
    assert_eq!(decision["allowed"], true);
    assert_eq!(decision["blocking"], json!([]));

    // The submission merged its flag into a new enrollment.
    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["pre_course_complete"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivation_is_forward_only(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let gate_id = quiz_assignment(&app, json!({"type": "course", "course_id": course_id}), "pre").await;
    let other_learner = token("learner-2", "learner");

    submit(&app, &learner(), gate_id, correct_answers()).await;

    let uri = format!("/api/v1/assignments/{gate_id}");
    patch_json(&app, &uri, &instructor(), json!({"active": false})).await;
    assert_eq!(access(&app, &other_learner, course_id, None).await["allowed"], true);

    let res = get(&app, &format!("{uri}/response"), &learner()).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["is_complete"], true);

    patch_json(&app, &uri, &instructor(), json!({"active": true})).await;
    assert_eq!(access(&app, &learner(), course_id, None).await["allowed"], true);
    assert_eq!(access(&app, &other_learner, course_id, None).await["allowed"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn resubmission_keeps_a_single_response(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let assignment_id =
        quiz_assignment(&app, json!({"type": "course", "course_id": course_id}), "post").await;

    let first = expect_data(
        submit(&app, &learner(), assignment_id, correct_answers()).await,
        StatusCode::OK,
    )
    .await;
    let second = expect_data(
        submit(&app, &learner(), assignment_id, correct_answers()).await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(first["response_id"], second["response_id"]);
    assert_eq!(first["resubmitted"], false);
    assert_eq!(second["resubmitted"], true);
    assert_eq!(first["score"], json!({"earned": 2, "total": 2}));
    assert_eq!(second["score"], first["score"]);

    let res = get(
        &app,
        &format!("/api/v1/assignments/{assignment_id}/response"),
        &learner(),
    )
    .await;
    let stored = expect_data(res, StatusCode::OK).await;
    assert_eq!(stored["id"], first["response_id"]);
    assert_eq!(stored["score"], json!({"earned": 2, "total": 2}));

    // Other learners cannot see it.
    let res = get(
        &app,
        &format!("/api/v1/assignments/{assignment_id}/response"),
        &token("learner-2", "learner"),
    )
    .await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn scoring_follows_answer_keys(pool: PgPool) {
    let app = build_test_app(pool);
    let token = instructor();
    let course_id = create_course(&app, &token).await;
    let scope = json!({"type": "course", "course_id": course_id});

    let weighted = json!({
        "title": "Level",
        "purpose": "quiz",
        "questions": [{
            "id": "level",
            "type": "single",
            "prompt": "Pick one",
            "options": [{"id": "a", "label": "low"}, {"id": "b", "label": "high"}],
            "correct": ["b"],
            "points": 2
        }]
    });
    let quiz_id = create_template(&app, &token, weighted).await["id"].as_i64().unwrap();
    let quiz = create_assignment(&app, &token, quiz_id, scope.clone(), "post").await["id"]
        .as_i64()
        .unwrap();

    let right = submit(&app, &learner(), quiz, json!([{"question_id": "level", "value": "b"}])).await;
    assert_eq!(
        expect_data(right, StatusCode::OK).await["score"],
        json!({"earned": 2, "total": 2})
    );
    let wrong = submit(&app, &learner(), quiz, json!([{"question_id": "level", "value": "a"}])).await;
    assert_eq!(
        expect_data(wrong, StatusCode::OK).await["score"],
        json!({"earned": 0, "total": 2})
    );

    let survey_id = create_template(&app, &token, survey_body()).await["id"].as_i64().unwrap();
    let survey = create_assignment(&app, &token, survey_id, scope, "pre").await["id"]
        .as_i64()
        .unwrap();
    let res = submit(&app, &learner(), survey, json!([{"question_id": "confidence", "value": 4}])).await;
    let outcome = expect_data(res, StatusCode::OK).await;
    assert!(outcome.get("score").is_none());

    let res = get(&app, &format!("/api/v1/assignments/{survey}/response"), &learner()).await;
    assert!(expect_data(res, StatusCode::OK).await.get("score").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_answers_are_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let token = instructor();
    let course_id = create_course(&app, &token).await;
    let survey_id = create_template(&app, &token, survey_body()).await["id"].as_i64().unwrap();
    let survey = create_assignment(
        &app,
        &token,
        survey_id,
        json!({"type": "course", "course_id": course_id}),
        "pre",
    )
    .await["id"]
        .as_i64()
        .unwrap();

    for answers in [
        json!([]),
        json!([{"question_id": "confidence", "value": 9}]),
        json!([{"question_id": "confidence", "value": "high"}]),
        json!([{"question_id": "unknown", "value": 3}]),
    ] {
        let res = submit(&app, &learner(), survey, answers).await;
        expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR").await;
    }

    let res = get(&app, &format!("/api/v1/assignments/{survey}/response"), &learner()).await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_key_replays_the_stored_outcome(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let assignment_id =
        quiz_assignment(&app, json!({"type": "course", "course_id": course_id}), "post").await;
    let uri = format!("/api/v1/assignments/{assignment_id}/submit");
    let body = json!({"answers": correct_answers()});

    let first = post_json_with_key(&app, &uri, &learner(), "submit-1", body.clone()).await;
    let first = expect_data(first, StatusCode::OK).await;
    let replay = post_json_with_key(&app, &uri, &learner(), "submit-1", body).await;
    let replay = expect_data(replay, StatusCode::OK).await;

    // Identical, including the timestamp: nothing was re-executed.
    assert_eq!(first, replay);
    assert_eq!(replay["resubmitted"], false);

    let changed = json!({"answers": [{"question_id": "q1", "value": "a"}]});
    let res = post_json_with_key(&app, &uri, &learner(), "submit-1", changed).await;
    expect_error(res, StatusCode::CONFLICT, "CONFLICT").await;

    // Keys are scoped per caller.
    let other = token("learner-2", "learner");
    let res = post_json_with_key(
        &app,
        &uri,
        &other,
        "submit-1",
        json!({"answers": correct_answers()}),
    )
    .await;
    assert_eq!(expect_data(res, StatusCode::OK).await["resubmitted"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn module_completion_counts_once(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let first = create_module(&app, &instructor(), course_id).await;
    let second = create_module(&app, &instructor(), course_id).await;
    let post_course =
        quiz_assignment(&app, json!({"type": "course", "course_id": course_id}), "post").await;
    enroll(&app, &learner(), course_id).await;

    let done = expect_data(complete(&app, &learner(), course_id, first).await, StatusCode::OK).await;
    assert_eq!(done["completed_count"], 1);
    assert_eq!(done["progress_pct"], 50);
    assert_eq!(done["last_module_index"], 1);
    assert_eq!(done["was_already_completed"], false);

    let replay = expect_data(complete(&app, &learner(), course_id, first).await, StatusCode::OK).await;
    assert_eq!(replay["was_already_completed"], true);
    assert_eq!(replay["completed_count"], 1);

    let last = expect_data(complete(&app, &learner(), course_id, second).await, StatusCode::OK).await;
    assert_eq!(last["completed"], true);
    assert_eq!(last["course_completed_now"], true);
    assert_eq!(last["progress_pct"], 100);
    assert_eq!(course_completion_count(&app, course_id).await, 1);

    // The post-course questionnaire would also qualify, but the course is
    // already complete.
    let res = submit(&app, &learner(), post_course, correct_answers()).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["course_completed"], false);
    let replay = expect_data(complete(&app, &learner(), course_id, second).await, StatusCode::OK).await;
    assert_eq!(replay["course_completed_now"], false);
    assert_eq!(course_completion_count(&app, course_id).await, 1);

    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    let enrollment = expect_data(res, StatusCode::OK).await;
    assert_eq!(enrollment["post_course_complete"], true);
    assert_eq!(enrollment["completed_count"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_key_replays_the_stored_outcome(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let module_id = create_module(&app, &instructor(), course_id).await;
    create_module(&app, &instructor(), course_id).await;
    enroll(&app, &learner(), course_id).await;
    let uri = format!("/api/v1/courses/{course_id}/modules/{module_id}/complete");

    let first = post_json_with_key(&app, &uri, &learner(), "complete-1", json!({})).await;
    let first = expect_data(first, StatusCode::OK).await;
    let replay = post_json_with_key(&app, &uri, &learner(), "complete-1", json!({})).await;
    let replay = expect_data(replay, StatusCode::OK).await;

    assert_eq!(first, replay);
    assert_eq!(replay["was_already_completed"], false);
    assert_eq!(replay["completed_count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_order_completion_advances_the_resume_pointer(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let mut modules = Vec::new();
    for _ in 0..4 {
        modules.push(create_module(&app, &instructor(), course_id).await);
    }
    enroll(&app, &learner(), course_id).await;

    let mut last = Value::Null;
    for index in [0, 1, 3] {
        last = expect_data(
            complete(&app, &learner(), course_id, modules[index]).await,
            StatusCode::OK,
        )
        .await;
    }
    assert_eq!(last["completed_count"], 3);
    assert_eq!(last["last_module_index"], 4);
    assert_eq!(last["progress_pct"], 75);
    assert_eq!(last["completed"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn module_gate_blocks_completion(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let gated = create_module(&app, &instructor(), course_id).await;
    let open = create_module(&app, &instructor(), course_id).await;
    let gate_id = quiz_assignment(
        &app,
        json!({"type": "module", "course_id": course_id, "module_id": gated}),
        "pre",
    )
    .await;
    enroll(&app, &learner(), course_id).await;

    assert_eq!(access(&app, &learner(), course_id, Some(open)).await["allowed"], true);

    let res = complete(&app, &learner(), course_id, gated).await;
    let body = expect_error(res, StatusCode::FORBIDDEN, "GATE_BLOCKED").await;
    assert_eq!(body["blocking"], json!([gate_id]));

    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["completed_count"], 0);

    submit(&app, &learner(), gate_id, correct_answers()).await;
    let done = expect_data(complete(&app, &learner(), course_id, gated).await, StatusCode::OK).await;
    assert_eq!(done["completed_count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completion_preconditions(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let module_id = create_module(&app, &instructor(), course_id).await;
    let other_course = create_course(&app, &instructor()).await;
    let foreign_module = create_module(&app, &instructor(), other_course).await;

    // Not enrolled.
    let res = complete(&app, &learner(), course_id, module_id).await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    enroll(&app, &learner(), course_id).await;

    let res = complete(&app, &learner(), course_id, foreign_module).await;
    expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "MODULE_COURSE_MISMATCH").await;

    let res = post_json(
        &app,
        &format!("/api/v1/courses/{course_id}/modules/{module_id}/complete"),
        &learner(),
        json!({"module_index": 3}),
    )
    .await;
    expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR").await;

    let res = post_json(
        &app,
        &format!("/api/v1/courses/{course_id}/modules/{module_id}/complete"),
        &learner(),
        json!({"module_index": 0}),
    )
    .await;
    assert_eq!(expect_data(res, StatusCode::OK).await["completed"], true);

    let res = get(
        &app,
        &format!("/api/v1/courses/{course_id}/access?module_id={foreign_module}"),
        &learner(),
    )
    .await;
    expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "MODULE_COURSE_MISMATCH").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completion_without_a_body_uses_the_module_position(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    create_module(&app, &instructor(), course_id).await;
    let second = create_module(&app, &instructor(), course_id).await;
    enroll(&app, &learner(), course_id).await;

    let res = send(
        &app,
        Method::POST,
        &format!("/api/v1/courses/{course_id}/modules/{second}/complete"),
        Some(&learner()),
        None,
        None,
    )
    .await;
    let done = expect_data(res, StatusCode::OK).await;
    assert_eq!(done["completed_count"], 1);
    assert_eq!(done["last_module_index"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn parallel_completions_count_once(pool: PgPool) {
    let app = build_test_app(pool);
    let course_id = create_course(&app, &instructor()).await;
    let first = create_module(&app, &instructor(), course_id).await;
    let last = create_module(&app, &instructor(), course_id).await;
    let post_course =
        quiz_assignment(&app, json!({"type": "course", "course_id": course_id}), "post").await;
    enroll(&app, &learner(), course_id).await;

    let mut tasks = JoinSet::new();
    for _ in 0..6 {
        let app = app.clone();
        tasks.spawn(async move {
            let res = complete(&app, &learner(), course_id, first).await;
            expect_data(res, StatusCode::OK).await
        });
    }
    let mut fresh = 0;
    while let Some(done) = tasks.join_next().await {
        let done = done.unwrap();
        assert_eq!(done["completed_count"], 1);
        if done["was_already_completed"] == false {
            fresh += 1;
        }
    }
    assert_eq!(fresh, 1);

    // The final module and the post-course submission race to finish the
    // course; the counter moves once whichever commits first.
    let completing = {
        let app = app.clone();
        tokio::spawn(async move {
            expect_data(complete(&app, &learner(), course_id, last).await, StatusCode::OK).await
        })
    };
    let submitting = {
        let app = app.clone();
        tokio::spawn(async move {
            let res = submit(&app, &learner(), post_course, correct_answers()).await;
            expect_data(res, StatusCode::OK).await
        })
    };
    let completed = completing.await.unwrap();
    let submitted = submitting.await.unwrap();

    let flips = [
        completed["course_completed_now"] == true,
        submitted["course_completed"] == true,
    ];
    assert_eq!(flips.iter().filter(|f| **f).count(), 1);

    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    let enrollment = expect_data(res, StatusCode::OK).await;
    assert_eq!(enrollment["completed"], true);
    assert_eq!(enrollment["completed_count"], 2);
    assert_eq!(enrollment["post_course_complete"], true);
    assert_eq!(course_completion_count(&app, course_id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_course_submission_can_finish_the_course(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let course_id = create_course(&app, &instructor()).await;
    let first = create_module(&app, &instructor(), course_id).await;
    let second = create_module(&app, &instructor(), course_id).await;
    let dropped = create_module(&app, &instructor(), course_id).await;
    let post_course =
        quiz_assignment(&app, json!({"type": "course", "course_id": course_id}), "post").await;
    enroll(&app, &learner(), course_id).await;

    for module_id in [first, second] {
        complete(&app, &learner(), course_id, module_id).await;
    }

    // The course shrinks to the two modules already done.
    sqlx::query("DELETE FROM modules WHERE id = $1")
        .bind(dropped)
        .execute(&pool)
        .await
        .unwrap();

    let res = submit(&app, &learner(), post_course, correct_answers()).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["course_completed"], true);
    assert_eq!(course_completion_count(&app, course_id).await, 1);

    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    let enrollment = expect_data(res, StatusCode::OK).await;
    assert_eq!(enrollment["completed"], true);
    assert_eq!(enrollment["post_course_complete"], true);

    // A resubmission does not count the course again.
    let res = submit(&app, &learner(), post_course, correct_answers()).await;
    assert_eq!(expect_data(res, StatusCode::OK).await["course_completed"], false);
    assert_eq!(course_completion_count(&app, course_id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn module_submissions_set_progress_flags(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let course_id = create_course(&app, &instructor()).await;
    let module_id = create_module(&app, &instructor(), course_id).await;
    let scope = json!({"type": "module", "course_id": course_id, "module_id": module_id});
    let pre = quiz_assignment(&app, scope.clone(), "pre").await;
    let post = quiz_assignment(&app, scope, "post").await;

    assert_eq!(module_flags(&pool, module_id).await, None);

    submit(&app, &learner(), pre, correct_answers()).await;
    assert_eq!(module_flags(&pool, module_id).await, Some((true, false)));

    submit(&app, &learner(), post, correct_answers()).await;
    assert_eq!(module_flags(&pool, module_id).await, Some((true, true)));

    // Module flags never create an enrollment.
    let res = get(&app, &format!("/api/v1/courses/{course_id}/enrollment"), &learner()).await;
    expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}
