//! Template Store endpoints. Templates are private to their owner.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use syllabus_core::error::CoreError;
use syllabus_core::questionnaire::UpsertTemplate;
use syllabus_core::scope::ensure_owner;
use syllabus_core::types::DbId;
use syllabus_db::models::questionnaire::Questionnaire;
use syllabus_db::repositories::QuestionnaireRepo;
use syllabus_events::{event_types, LearningEvent};

use crate::engine::templates::upsert_template;
use crate::error::AppResult;
use crate::middleware::rbac::RequireInstructor;
use crate::response::DataResponse;
use crate::state::AppState;

/// A template with every version number it has published.
#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub questionnaire: Questionnaire,
    pub versions: Vec<i32>,
}

/// GET /api/v1/questionnaires
pub async fn list_templates(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Questionnaire>>>> {
    let templates = QuestionnaireRepo::list_by_owner(&state.pool, &auth.uid).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// POST /api/v1/questionnaires
///
/// Creates a template, or edits one when the body carries `template_id`.
pub async fn create_template(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Json(input): Json<UpsertTemplate>,
) -> AppResult<impl IntoResponse> {
    let (template, created) = upsert_template(&state.pool, &auth.uid, &input).await?;
    publish_saved(&state, &auth.uid, &template, created);

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: template })))
}

/// PUT /api/v1/questionnaires/{id}
pub async fn update_template(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpsertTemplate>,
) -> AppResult<Json<DataResponse<Questionnaire>>> {
    input.template_id = Some(id);
    let (template, created) = upsert_template(&state.pool, &auth.uid, &input).await?;
    publish_saved(&state, &auth.uid, &template, created);
    Ok(Json(DataResponse { data: template }))
}

/// GET /api/v1/questionnaires/{id}
pub async fn get_template(
    RequireInstructor(auth): RequireInstructor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TemplateDetail>>> {
    let questionnaire = QuestionnaireRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Questionnaire",
            id,
        })?;
    ensure_owner(&questionnaire.owner_id, &auth.uid, "questionnaire")?;
    let versions = QuestionnaireRepo::list_versions(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: TemplateDetail {
            questionnaire,
            versions,
        },
    }))
}

fn publish_saved(state: &AppState, uid: &str, template: &Questionnaire, created: bool) {
    tracing::info!(
        uid,
        questionnaire_id = template.id,
        version = template.version,
        created,
        "Questionnaire saved",
    );
    state.event_bus.publish(
        LearningEvent::new(event_types::TEMPLATE_SAVED)
            .with_source("questionnaire", template.id)
            .with_actor(uid)
            .with_payload(json!({
                "version": template.version,
                "purpose": template.purpose,
                "created": created,
            })),
    );
}
