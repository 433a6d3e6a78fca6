//! Assignment endpoints: binding for owners, start/submit for learners.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use syllabus_core::error::CoreError;
use syllabus_core::grading::{Answer, Score};
use syllabus_core::types::{DbId, Timestamp};
use syllabus_db::models::assignment::{Assignment, UpdateAssignment, UpsertAssignment};
use syllabus_db::models::response::Response;
use syllabus_db::repositories::ResponseRepo;
use syllabus_events::{event_types, LearningEvent};

use crate::engine::binder;
use crate::engine::grader::{self, StartedAssignment, SubmitOutcome};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::idempotency::IdempotencyKey;
use crate::middleware::rbac::RequireInstructor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: Vec<Answer>,
}

/// The learner's stored response, with its score when the questionnaire
/// is scored.
#[derive(Debug, Serialize)]
pub struct ResponseView {
    pub id: DbId,
    pub assignment_id: DbId,
    pub questionnaire_version: i32,
    pub answers: Vec<Answer>,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    pub submitted_at: Timestamp,
}

impl From<Response> for ResponseView {
    fn from(response: Response) -> Self {
        let score = response.score();
        Self {
            id: response.id,
            assignment_id: response.assignment_id,
            questionnaire_version: response.questionnaire_version,
            answers: response.answers.0,
            is_complete: response.is_complete,
            score,
            submitted_at: response.submitted_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Owner operations
// ---------------------------------------------------------------------------

/// POST /api/v1/assignments
///
/// Creates an assignment, or re-binds one when the body carries
/// `assignment_id`.
pub async fn upsert_assignment(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Json(input): Json<UpsertAssignment>,
) -> AppResult<impl IntoResponse> {
    let (assignment, created) = binder::upsert_assignment(&state.pool, &auth.uid, &input).await?;
    publish_saved(&state, &auth.uid, &assignment);

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: assignment })))
}

/// PATCH /api/v1/assignments/{id}
pub async fn update_assignment(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAssignment>,
) -> AppResult<Json<DataResponse<Assignment>>> {
    let assignment = binder::update_assignment(&state.pool, &auth.uid, id, &input).await?;
    publish_saved(&state, &auth.uid, &assignment);
    Ok(Json(DataResponse { data: assignment }))
}

/// DELETE /api/v1/assignments/{id}
pub async fn delete_assignment(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = binder::delete_assignment(&state.pool, &auth.uid, id).await?;

    tracing::info!(uid = %auth.uid, assignment_id = id, "Assignment deleted");
    state.event_bus.publish(
        LearningEvent::new(event_types::ASSIGNMENT_DELETED)
            .with_source("assignment", id)
            .with_actor(auth.uid.as_str())
            .with_payload(json!({ "course_id": deleted.course_id })),
    );

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Learner operations
// ---------------------------------------------------------------------------

/// GET /api/v1/assignments/{id}/start
pub async fn start_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StartedAssignment>>> {
    let started = grader::start_assignment(&state.pool, &auth.uid, id).await?;
    Ok(Json(DataResponse { data: started }))
}

/// POST /api/v1/assignments/{id}/submit
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    key: IdempotencyKey,
    Json(input): Json<SubmitRequest>,
) -> AppResult<Json<DataResponse<SubmitOutcome>>> {
    let executed =
        grader::submit(&state.pool, &auth.uid, id, &input.answers, key.as_deref()).await?;
    let outcome = executed.outcome;

    if !executed.replayed {
        tracing::info!(
            uid = %auth.uid,
            assignment_id = id,
            response_id = outcome.response_id,
            is_complete = outcome.is_complete,
            "Response submitted",
        );
        state.event_bus.publish(
            LearningEvent::new(event_types::RESPONSE_SUBMITTED)
                .with_source("assignment", id)
                .with_actor(auth.uid.as_str())
                .with_payload(json!({
                    "response_id": outcome.response_id,
                    "questionnaire_version": outcome.questionnaire_version,
                    "score": outcome.score,
                    "resubmitted": outcome.resubmitted,
                })),
        );
        if outcome.course_completed {
            tracing::info!(uid = %auth.uid, assignment_id = id, "Course completed");
            state.event_bus.publish(
                LearningEvent::new(event_types::COURSE_COMPLETED)
                    .with_source("assignment", id)
                    .with_actor(auth.uid.as_str()),
            );
        }
    }

    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/assignments/{id}/response
pub async fn get_response(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ResponseView>>> {
    let response = ResponseRepo::find_for_user(&state.pool, &auth.uid, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Response",
            id,
        })?;
    Ok(Json(DataResponse {
        data: response.into(),
    }))
}

fn publish_saved(state: &AppState, uid: &str, assignment: &Assignment) {
    tracing::info!(
        uid,
        assignment_id = assignment.id,
        course_id = assignment.course_id,
        questionnaire_version = assignment.questionnaire_version,
        active = assignment.active,
        "Assignment saved",
    );
    state.event_bus.publish(
        LearningEvent::new(event_types::ASSIGNMENT_SAVED)
            .with_source("assignment", assignment.id)
            .with_actor(uid)
            .with_payload(json!({
                "questionnaire_id": assignment.questionnaire_id,
                "questionnaire_version": assignment.questionnaire_version,
                "scope_type": assignment.scope_type,
                "timing": assignment.timing,
                "active": assignment.active,
            })),
    );
}
