//! Learner-facing course endpoints: enrollment, access checks and module
//! completion.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use syllabus_core::gate::GateDecision;
use syllabus_core::scope::AccessTarget;
use syllabus_core::types::DbId;
use syllabus_db::models::assignment::AssignmentSummary;
use syllabus_db::models::enrollment::Enrollment;
use syllabus_events::{event_types, LearningEvent};

use crate::engine::completion::{self, ModuleCompletion};
use crate::engine::gate::can_access;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::idempotency::IdempotencyKey;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AccessParams {
    pub module_id: Option<DbId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteModuleRequest {
    /// Defaults to the module's position.
    #[serde(default)]
    pub module_index: Option<i32>,
}

/// POST /api/v1/courses/{id}/enroll
///
/// 201 on first enrollment, 200 when the learner was already enrolled.
pub async fn enroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    key: IdempotencyKey,
) -> AppResult<impl IntoResponse> {
    let executed = completion::enroll(&state.pool, &auth.uid, course_id, key.as_deref()).await?;
    let outcome = executed.outcome;

    if outcome.created && !executed.replayed {
        tracing::info!(uid = %auth.uid, course_id, "Learner enrolled");
        state.event_bus.publish(
            LearningEvent::new(event_types::ENROLLMENT_CREATED)
                .with_source("course", course_id)
                .with_actor(auth.uid.as_str()),
        );
    }

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(DataResponse {
            data: outcome.enrollment,
        }),
    ))
}

/// GET /api/v1/courses/{id}/enrollment
pub async fn get_enrollment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Enrollment>>> {
    let enrollment = completion::get_enrollment(&state.pool, &auth.uid, course_id).await?;
    Ok(Json(DataResponse { data: enrollment }))
}

/// GET /api/v1/courses/{id}/access?module_id=
pub async fn access(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    Query(params): Query<AccessParams>,
) -> AppResult<Json<DataResponse<GateDecision<AssignmentSummary>>>> {
    let target = AccessTarget {
        course_id,
        module_id: params.module_id,
    };
    let mut conn = state.pool.acquire().await?;
    let decision = can_access(&mut conn, &auth.uid, &target).await?;

    tracing::debug!(
        uid = %auth.uid,
        course_id,
        module_id = ?params.module_id,
        allowed = decision.allowed,
        "Gate evaluated",
    );

    Ok(Json(DataResponse { data: decision }))
}

/// POST /api/v1/courses/{id}/modules/{module_id}/complete
///
/// The body is optional; without one the module's own position is used.
pub async fn complete_module(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(DbId, DbId)>,
    key: IdempotencyKey,
    input: Option<Json<CompleteModuleRequest>>,
) -> AppResult<Json<DataResponse<ModuleCompletion>>> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    let executed = completion::complete_module(
        &state.pool,
        &auth.uid,
        course_id,
        module_id,
        input.module_index,
        key.as_deref(),
    )
    .await?;
    let outcome = executed.outcome;

    if !executed.replayed && !outcome.was_already_completed {
        tracing::info!(
            uid = %auth.uid,
            course_id,
            module_id,
            progress_pct = outcome.progress_pct,
            "Module completed",
        );
        state.event_bus.publish(
            LearningEvent::new(event_types::MODULE_COMPLETED)
                .with_source("module", module_id)
                .with_actor(auth.uid.as_str())
                .with_payload(json!({
                    "course_id": course_id,
                    "progress_pct": outcome.progress_pct,
                    "completed_count": outcome.completed_count,
                })),
        );
    }
    if !executed.replayed && outcome.course_completed_now {
        tracing::info!(uid = %auth.uid, course_id, "Course completed");
        state.event_bus.publish(
            LearningEvent::new(event_types::COURSE_COMPLETED)
                .with_source("course", course_id)
                .with_actor(auth.uid.as_str()),
        );
    }

    Ok(Json(DataResponse { data: outcome }))
}
