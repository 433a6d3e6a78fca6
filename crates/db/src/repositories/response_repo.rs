//! Repository for the `responses` table.

use sqlx::types::Json;
use sqlx::PgExecutor;
use syllabus_core::types::DbId;

use crate::models::response::{Response, UpsertResponse};

/// Column list for `responses` queries.
const COLUMNS: &str = "\
    id, uid, assignment_id, questionnaire_id, questionnaire_version, scope_type, \
    course_id, module_id, answers, is_complete, score_earned, score_total, \
    submitted_at, created_at, updated_at";

/// Provides keyed upsert and lookups for learner responses.
pub struct ResponseRepo;

impl ResponseRepo {
    /// Insert or overwrite the single response for (uid, assignment_id).
    ///
    /// Returns the row and whether it was newly created.
    pub async fn upsert<'e, E>(
        executor: E,
        input: &UpsertResponse<'_>,
    ) -> Result<(Response, bool), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        // `xmax = 0` holds only for a freshly inserted tuple.
        let query = format!(
            "INSERT INTO responses \
                (uid, assignment_id, questionnaire_id, questionnaire_version, scope_type, \
                 course_id, module_id, answers, is_complete, score_earned, score_total, submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $10, NOW()) \
             ON CONFLICT ON CONSTRAINT uq_responses_uid_assignment DO UPDATE SET \
                questionnaire_id = EXCLUDED.questionnaire_id, \
                questionnaire_version = EXCLUDED.questionnaire_version, \
                scope_type = EXCLUDED.scope_type, \
                course_id = EXCLUDED.course_id, \
                module_id = EXCLUDED.module_id, \
                answers = EXCLUDED.answers, \
                is_complete = TRUE, \
                score_earned = EXCLUDED.score_earned, \
                score_total = EXCLUDED.score_total, \
                submitted_at = EXCLUDED.submitted_at \
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, ResponseWithFlag>(&query)
            .bind(input.uid)
            .bind(input.assignment_id)
            .bind(input.questionnaire_id)
            .bind(input.questionnaire_version)
            .bind(input.scope_type)
            .bind(input.course_id)
            .bind(input.module_id)
            .bind(Json(input.answers))
            .bind(input.score.map(|s| s.earned))
            .bind(input.score.map(|s| s.total))
            .fetch_one(executor)
            .await?;
        Ok((row.response, row.inserted))
    }

    /// The learner's response to one assignment, if any.
    pub async fn find_for_user<'e, E>(
        executor: E,
        uid: &str,
        assignment_id: DbId,
    ) -> Result<Option<Response>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM responses WHERE uid = $1 AND assignment_id = $2");
        sqlx::query_as::<_, Response>(&query)
            .bind(uid)
            .bind(assignment_id)
            .fetch_optional(executor)
            .await
    }

    /// Number of responses recorded against an assignment.
    pub async fn count_by_assignment<'e, E>(executor: E, assignment_id: DbId) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM responses WHERE assignment_id = $1")
            .bind(assignment_id)
            .fetch_one(executor)
            .await
    }

    /// Subset of `assignment_ids` the learner has a completed response for.
    pub async fn completed_assignment_ids<'e, E>(
        executor: E,
        uid: &str,
        assignment_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if assignment_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, DbId>(
            "SELECT assignment_id FROM responses \
             WHERE uid = $1 AND assignment_id = ANY($2) AND is_complete = TRUE",
        )
        .bind(uid)
        .bind(assignment_ids)
        .fetch_all(executor)
        .await
    }
}

#[derive(sqlx::FromRow)]
struct ResponseWithFlag {
    #[sqlx(flatten)]
    response: Response,
    inserted: bool,
}
