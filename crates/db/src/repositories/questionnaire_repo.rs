//! Repository for the `questionnaires` and `questionnaire_versions` tables.

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use syllabus_core::types::DbId;

use crate::models::questionnaire::{Questionnaire, TemplateVersionInput};

/// Column list for `questionnaires` queries.
const COLUMNS: &str = "id, owner_id, title, purpose, version, questions, created_at, updated_at";

/// Provides versioned storage for questionnaire templates.
pub struct QuestionnaireRepo;

impl QuestionnaireRepo {
    /// Insert a new template at `input.version`.
    pub async fn create<'e, E>(
        executor: E,
        owner_id: &str,
        input: &TemplateVersionInput<'_>,
    ) -> Result<Questionnaire, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO questionnaires (owner_id, title, purpose, version, questions) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Questionnaire>(&query)
            .bind(owner_id)
            .bind(input.title)
            .bind(input.purpose.as_str())
            .bind(input.version)
            .bind(Json(input.questions))
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Questionnaire>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM questionnaires WHERE id = $1");
        sqlx::query_as::<_, Questionnaire>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Like [`find_by_id`](Self::find_by_id), locking the row until the
    /// surrounding transaction ends. Serializes concurrent version bumps.
    pub async fn find_for_update<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Questionnaire>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM questionnaires WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Questionnaire>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Replace the current version of a template.
    pub async fn update_version<'e, E>(
        executor: E,
        id: DbId,
        input: &TemplateVersionInput<'_>,
    ) -> Result<Questionnaire, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE questionnaires SET title = $2, purpose = $3, version = $4, questions = $5 \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Questionnaire>(&query)
            .bind(id)
            .bind(input.title)
            .bind(input.purpose.as_str())
            .bind(input.version)
            .bind(Json(input.questions))
            .fetch_one(executor)
            .await
    }

    /// Record an immutable snapshot of one version.
    pub async fn insert_version_snapshot<'e, E>(
        executor: E,
        questionnaire_id: DbId,
        input: &TemplateVersionInput<'_>,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO questionnaire_versions (questionnaire_id, version, title, purpose, questions) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(questionnaire_id)
        .bind(input.version)
        .bind(input.title)
        .bind(input.purpose.as_str())
        .bind(Json(input.questions))
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Versions recorded for a template, oldest first.
    pub async fn list_versions(pool: &PgPool, questionnaire_id: DbId) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT version FROM questionnaire_versions \
             WHERE questionnaire_id = $1 ORDER BY version ASC",
        )
        .bind(questionnaire_id)
        .fetch_all(pool)
        .await
    }

    /// List templates owned by `owner_id`, most recently updated first.
    pub async fn list_by_owner(pool: &PgPool, owner_id: &str) -> Result<Vec<Questionnaire>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questionnaires WHERE owner_id = $1 ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, Questionnaire>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }
}
