//! Repository for the `assignments` table.

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use syllabus_core::scope::{Scope, Timing, TIMING_PRE};
use syllabus_core::types::DbId;

use crate::models::assignment::{Assignment, AssignmentBinding, AssignmentSummary};

/// Column list for full `assignments` rows, including the frozen questions.
const COLUMNS: &str = "\
    id, owner_id, questionnaire_id, questionnaire_version, title, purpose, \
    questions, scope_type, course_id, module_id, timing, active, \
    created_at, updated_at";

/// Column list for [`AssignmentSummary`].
const SUMMARY_COLUMNS: &str = "\
    id, questionnaire_id, questionnaire_version, title, scope_type, \
    course_id, module_id, timing, active";

/// Provides CRUD and gate lookups for assignments.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Insert a new assignment with its frozen question snapshot.
    pub async fn create<'e, E>(
        executor: E,
        binding: &AssignmentBinding<'_>,
    ) -> Result<Assignment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO assignments \
                (owner_id, questionnaire_id, questionnaire_version, title, purpose, questions, \
                 scope_type, course_id, module_id, timing, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(binding.owner_id)
            .bind(binding.questionnaire_id)
            .bind(binding.questionnaire_version)
            .bind(binding.title)
            .bind(binding.purpose)
            .bind(Json(binding.questions))
            .bind(binding.scope.scope_type.as_str())
            .bind(binding.scope.course_id)
            .bind(binding.scope.module_id)
            .bind(binding.timing.as_str())
            .bind(binding.active)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Assignment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM assignments WHERE id = $1");
        sqlx::query_as::<_, Assignment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the row for the rest of the transaction.
    pub async fn find_for_update<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Assignment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM assignments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Assignment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Re-bind an existing assignment: new template snapshot, scope, timing
    /// and active flag. `course_id` is never changed here.
    pub async fn rebind<'e, E>(
        executor: E,
        id: DbId,
        binding: &AssignmentBinding<'_>,
    ) -> Result<Assignment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE assignments SET \
                questionnaire_id = $2, questionnaire_version = $3, title = $4, purpose = $5, \
                questions = $6, scope_type = $7, module_id = $8, timing = $9, active = $10 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(id)
            .bind(binding.questionnaire_id)
            .bind(binding.questionnaire_version)
            .bind(binding.title)
            .bind(binding.purpose)
            .bind(Json(binding.questions))
            .bind(binding.scope.scope_type.as_str())
            .bind(binding.scope.module_id)
            .bind(binding.timing.as_str())
            .bind(binding.active)
            .fetch_one(executor)
            .await
    }

    /// Update scope, timing and active flag. The frozen snapshot is untouched.
    pub async fn update_fields<'e, E>(
        executor: E,
        id: DbId,
        scope: &Scope,
        timing: Timing,
        active: bool,
    ) -> Result<Assignment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE assignments SET scope_type = $2, module_id = $3, timing = $4, active = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(id)
            .bind(scope.scope_type.as_str())
            .bind(scope.module_id)
            .bind(timing.as_str())
            .bind(active)
            .fetch_one(executor)
            .await
    }

    /// Hard-delete an assignment. Returns `true` if a row was removed.
    pub async fn delete<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All assignments in a course, for the course owner.
    pub async fn list_by_course(pool: &PgPool, course_id: DbId) -> Result<Vec<Assignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assignments WHERE course_id = $1 \
             ORDER BY module_id NULLS FIRST, timing, id"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    /// Active pre-timed assignments that can gate `course_id` or, when
    /// given, `module_id`: course-level gates plus that module's gates.
    pub async fn list_gate_candidates<'e, E>(
        executor: E,
        course_id: DbId,
        module_id: Option<DbId>,
    ) -> Result<Vec<AssignmentSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM assignments \
             WHERE course_id = $1 AND active = TRUE AND timing = $2 \
               AND (module_id IS NULL OR module_id = $3) \
             ORDER BY module_id NULLS FIRST, id"
        );
        sqlx::query_as::<_, AssignmentSummary>(&query)
            .bind(course_id)
            .bind(TIMING_PRE)
            .bind(module_id)
            .fetch_all(executor)
            .await
    }
}
