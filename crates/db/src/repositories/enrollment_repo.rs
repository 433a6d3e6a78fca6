//! Repository for the `enrollments` table.

use sqlx::PgExecutor;
use syllabus_core::progress::EnrollmentProgress;
use syllabus_core::types::DbId;

use crate::models::enrollment::{CourseFlag, Enrollment};

/// Column list for `enrollments` queries.
const COLUMNS: &str = "\
    id, uid, course_id, completed_count, progress_pct, last_module_index, \
    completed, completed_at, pre_course_complete, post_course_complete, \
    created_at, updated_at";

/// Provides enrollment lookups and aggregate updates.
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Create the enrollment for (uid, course_id) unless it exists.
    ///
    /// Returns the row and whether this call created it.
    pub async fn create_if_absent<'e, E>(
        executor: E,
        uid: &str,
        course_id: DbId,
    ) -> Result<(Enrollment, bool), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        // The no-op update makes RETURNING yield the existing row too.
        let query = format!(
            "INSERT INTO enrollments (uid, course_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_enrollments_uid_course \
             DO UPDATE SET uid = EXCLUDED.uid \
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, EnrollmentWithFlag>(&query)
            .bind(uid)
            .bind(course_id)
            .fetch_one(executor)
            .await?;
        Ok((row.enrollment, row.inserted))
    }

    pub async fn find<'e, E>(
        executor: E,
        uid: &str,
        course_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM enrollments WHERE uid = $1 AND course_id = $2");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(uid)
            .bind(course_id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the enrollment row for the rest of the transaction.
    ///
    /// Every path that mutates aggregates takes this lock first, so
    /// concurrent completions for one learner serialize here.
    pub async fn find_for_update<'e, E>(
        executor: E,
        uid: &str,
        course_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollments WHERE uid = $1 AND course_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(uid)
            .bind(course_id)
            .fetch_optional(executor)
            .await
    }

    /// Write recomputed counters. `completed` only ever moves to true.
    pub async fn update_progress<'e, E>(
        executor: E,
        id: DbId,
        progress: &EnrollmentProgress,
    ) -> Result<Enrollment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE enrollments SET \
                completed_count = $2, progress_pct = $3, last_module_index = $4, \
                completed = completed OR $5, \
                completed_at = CASE WHEN NOT completed AND $5 THEN NOW() ELSE completed_at END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .bind(progress.completed_count)
            .bind(progress.progress_pct)
            .bind(progress.last_module_index)
            .bind(progress.completed)
            .fetch_one(executor)
            .await
    }

    /// Set a course-level gating flag.
    pub async fn set_flag<'e, E>(executor: E, id: DbId, flag: CourseFlag) -> Result<Enrollment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE enrollments SET {} = TRUE WHERE id = $1 RETURNING {COLUMNS}",
            flag.column()
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Flip `completed` to true. Returns `None` if it already was.
    pub async fn mark_completed<'e, E>(executor: E, id: DbId) -> Result<Option<Enrollment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE enrollments SET completed = TRUE, completed_at = NOW() \
             WHERE id = $1 AND completed = FALSE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}

#[derive(sqlx::FromRow)]
struct EnrollmentWithFlag {
    #[sqlx(flatten)]
    enrollment: Enrollment,
    inserted: bool,
}
