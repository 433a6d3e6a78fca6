//! Repository for the `modules` table.

use sqlx::{PgExecutor, PgPool};
use syllabus_core::types::DbId;

use crate::models::course::Module;

/// Column list for `modules` queries.
const COLUMNS: &str = "id, course_id, title, position, created_at, updated_at";

/// Provides CRUD operations for course modules.
pub struct ModuleRepo;

impl ModuleRepo {
    /// Insert a module. A `None` position appends after the current last module.
    pub async fn create(
        pool: &PgPool,
        course_id: DbId,
        title: &str,
        position: Option<i32>,
    ) -> Result<Module, sqlx::Error> {
        let query = format!(
            "INSERT INTO modules (course_id, title, position) \
             VALUES ($1, $2, COALESCE($3, \
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM modules WHERE course_id = $1))) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Module>(&query)
            .bind(course_id)
            .bind(title)
            .bind(position)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Module>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM modules WHERE id = $1");
        sqlx::query_as::<_, Module>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List a course's modules in position order.
    pub async fn list_by_course(pool: &PgPool, course_id: DbId) -> Result<Vec<Module>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM modules WHERE course_id = $1 ORDER BY position ASC"
        );
        sqlx::query_as::<_, Module>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    /// Current module count of a course (`totalModules`).
    pub async fn count_by_course<'e, E>(executor: E, course_id: DbId) -> Result<i32, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i32>("SELECT COUNT(*)::INTEGER FROM modules WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(executor)
            .await
    }
}
