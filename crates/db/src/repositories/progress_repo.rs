//! Repository for the per-module `progress` table.

use sqlx::PgExecutor;
use syllabus_core::types::DbId;

use crate::models::progress::{ModuleFlag, Progress};

/// Column list for `progress` queries.
const COLUMNS: &str = "\
    id, uid, course_id, module_id, completed, completed_at, \
    pre_module_complete, post_module_complete, created_at, updated_at";

/// Provides idempotent per-module progress updates.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Make sure a row exists for (uid, course_id, module_id).
    pub async fn ensure_row<'e, E>(
        executor: E,
        uid: &str,
        course_id: DbId,
        module_id: DbId,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO progress (uid, course_id, module_id) VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_progress_uid_module DO NOTHING",
        )
        .bind(uid)
        .bind(course_id)
        .bind(module_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find<'e, E>(
        executor: E,
        uid: &str,
        course_id: DbId,
        module_id: DbId,
    ) -> Result<Option<Progress>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM progress WHERE uid = $1 AND course_id = $2 AND module_id = $3"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(uid)
            .bind(course_id)
            .bind(module_id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the progress row for the rest of the transaction.
    pub async fn find_for_update<'e, E>(
        executor: E,
        uid: &str,
        course_id: DbId,
        module_id: DbId,
    ) -> Result<Option<Progress>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM progress \
             WHERE uid = $1 AND course_id = $2 AND module_id = $3 FOR UPDATE"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(uid)
            .bind(course_id)
            .bind(module_id)
            .fetch_optional(executor)
            .await
    }

    /// Mark the module completed. Returns `None` if it already was.
    pub async fn mark_completed<'e, E>(executor: E, id: DbId) -> Result<Option<Progress>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE progress SET completed = TRUE, completed_at = NOW() \
             WHERE id = $1 AND completed = FALSE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Set a per-module gating flag, creating the row if needed.
    pub async fn set_flag<'e, E>(
        executor: E,
        uid: &str,
        course_id: DbId,
        module_id: DbId,
        flag: ModuleFlag,
    ) -> Result<Progress, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let column = flag.column();
        let query = format!(
            "INSERT INTO progress (uid, course_id, module_id, {column}) VALUES ($1, $2, $3, TRUE) \
             ON CONFLICT ON CONSTRAINT uq_progress_uid_module DO UPDATE SET {column} = TRUE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(uid)
            .bind(course_id)
            .bind(module_id)
            .fetch_one(executor)
            .await
    }
}
