//! Repository for the `courses` table.

use sqlx::PgExecutor;
use syllabus_core::types::DbId;

use crate::models::course::Course;

/// Column list for `courses` queries.
const COLUMNS: &str = "id, owner_id, title, completion_count, created_at, updated_at";

/// Provides create and lookup operations for courses.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a new course owned by `owner_id`.
    pub async fn create<'e, E>(executor: E, owner_id: &str, title: &str) -> Result<Course, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO courses (owner_id, title) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(owner_id)
            .bind(title)
            .fetch_one(executor)
            .await
    }

    /// Find a course by its internal ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Course>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Bump the course-level completion aggregate by one.
    ///
    /// Callers must only invoke this on an enrollment's false -> true
    /// `completed` transition, while holding that enrollment's row lock.
    pub async fn increment_completion_count<'e, E>(executor: E, id: DbId) -> Result<i32, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i32>(
            "UPDATE courses SET completion_count = completion_count + 1 \
             WHERE id = $1 RETURNING completion_count",
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }
}
