//! Template Store: versioned questionnaire templates.

use sqlx::PgPool;
use syllabus_core::error::CoreError;
use syllabus_core::questionnaire::{next_version, validate_template, UpsertTemplate};
use syllabus_core::scope::ensure_owner;
use syllabus_db::models::questionnaire::{Questionnaire, TemplateVersionInput};
use syllabus_db::repositories::QuestionnaireRepo;

use crate::error::AppResult;

/// Create a template, or publish a new version of an existing one.
///
/// Edits lock the template row so two concurrent edits cannot both claim
/// the same next version. Returns the stored template and whether it was
/// created.
pub async fn upsert_template(
    pool: &PgPool,
    caller: &str,
    input: &UpsertTemplate,
) -> AppResult<(Questionnaire, bool)> {
    validate_template(input)?;

    let mut tx = pool.begin().await?;

    let (template, created) = match input.template_id {
        Some(id) => {
            let existing = QuestionnaireRepo::find_for_update(&mut *tx, id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Questionnaire",
                    id,
                })?;
            ensure_owner(&existing.owner_id, caller, "questionnaire")?;

            let version_input = TemplateVersionInput {
                title: &input.title,
                purpose: input.purpose,
                version: next_version(Some(existing.version), input.version)?,
                questions: &input.questions,
            };
            let updated = QuestionnaireRepo::update_version(&mut *tx, id, &version_input).await?;
            QuestionnaireRepo::insert_version_snapshot(&mut *tx, id, &version_input).await?;
            (updated, false)
        }
        None => {
            let version_input = TemplateVersionInput {
                title: &input.title,
                purpose: input.purpose,
                version: next_version(None, input.version)?,
                questions: &input.questions,
            };
            let created = QuestionnaireRepo::create(&mut *tx, caller, &version_input).await?;
            QuestionnaireRepo::insert_version_snapshot(&mut *tx, created.id, &version_input)
                .await?;
            (created, true)
        }
    };

    tx.commit().await?;
    Ok((template, created))
}
