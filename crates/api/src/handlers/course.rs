//! Course and module authoring.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use syllabus_core::error::CoreError;
use syllabus_core::scope::ensure_owner;
use syllabus_core::types::DbId;
use syllabus_db::models::assignment::Assignment;
use syllabus_db::models::course::{Course, Module};
use syllabus_db::repositories::{AssignmentRepo, CourseRepo, ModuleRepo};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireInstructor;
use crate::response::DataResponse;
use crate::state::AppState;

/// A course with its modules in position order.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<Module>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateModuleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Appended after the last module when omitted.
    #[validate(range(min = 0))]
    pub position: Option<i32>,
}

fn validate_body<T: Validate>(input: &T) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    Ok(())
}

async fn load_owned_course(state: &AppState, caller: &str, course_id: DbId) -> AppResult<Course> {
    let course = CourseRepo::find_by_id(&state.pool, course_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        })?;
    ensure_owner(&course.owner_id, caller, "course")?;
    Ok(course)
}

/// POST /api/v1/courses
pub async fn create_course(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Json(input): Json<CreateCourseRequest>,
) -> AppResult<impl IntoResponse> {
    validate_body(&input)?;
    let course = CourseRepo::create(&state.pool, &auth.uid, input.title.trim()).await?;

    tracing::info!(uid = %auth.uid, course_id = course.id, "Course created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: course })))
}

/// GET /api/v1/courses/{id}
pub async fn get_course(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<CourseDetail>>> {
    let course = CourseRepo::find_by_id(&state.pool, course_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        })?;
    let modules = ModuleRepo::list_by_course(&state.pool, course_id).await?;

    Ok(Json(DataResponse {
        data: CourseDetail { course, modules },
    }))
}

/// POST /api/v1/courses/{id}/modules
pub async fn create_module(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
    Json(input): Json<CreateModuleRequest>,
) -> AppResult<impl IntoResponse> {
    validate_body(&input)?;
    load_owned_course(&state, &auth.uid, course_id).await?;

    let module =
        ModuleRepo::create(&state.pool, course_id, input.title.trim(), input.position).await?;

    tracing::info!(
        uid = %auth.uid,
        course_id,
        module_id = module.id,
        position = module.position,
        "Module created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: module })))
}

/// GET /api/v1/courses/{id}/assignments
pub async fn list_assignments(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Assignment>>>> {
    load_owned_course(&state, &auth.uid, course_id).await?;
    let assignments = AssignmentRepo::list_by_course(&state.pool, course_id).await?;
    Ok(Json(DataResponse { data: assignments }))
}
