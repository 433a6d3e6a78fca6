//! Repository for the `idempotency_keys` table.
//!
//! All three calls are meant to run inside the transaction of the operation
//! being deduplicated, so a claimed key and its stored result commit or roll
//! back together with the operation's own writes.

use sqlx::PgExecutor;
use syllabus_core::types::DbId;

use crate::models::idempotency::IdempotencyRecord;

/// Column list for `idempotency_keys` queries.
const COLUMNS: &str = "id, uid, operation, idem_key, request_hash, response, created_at";

pub struct IdempotencyRepo;

impl IdempotencyRepo {
    /// Try to claim a key. Returns the new row id, or `None` if another
    /// request already holds it.
    ///
    /// A concurrent claimant blocks on the unique index until the holder's
    /// transaction ends, then sees the committed row.
    pub async fn try_claim<'e, E>(
        executor: E,
        uid: &str,
        operation: &str,
        key: &str,
        request_hash: &str,
    ) -> Result<Option<DbId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO idempotency_keys (uid, operation, idem_key, request_hash) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_idempotency_keys_scope DO NOTHING \
             RETURNING id",
        )
        .bind(uid)
        .bind(operation)
        .bind(key)
        .bind(request_hash)
        .fetch_optional(executor)
        .await
    }

    pub async fn find<'e, E>(
        executor: E,
        uid: &str,
        operation: &str,
        key: &str,
    ) -> Result<Option<IdempotencyRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM idempotency_keys \
             WHERE uid = $1 AND operation = $2 AND idem_key = $3"
        );
        sqlx::query_as::<_, IdempotencyRecord>(&query)
            .bind(uid)
            .bind(operation)
            .bind(key)
            .fetch_optional(executor)
            .await
    }

    /// Attach the operation's result to a claimed key.
    pub async fn store_response<'e, E>(
        executor: E,
        id: DbId,
        response: &serde_json::Value,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE idempotency_keys SET response = $2 WHERE id = $1")
            .bind(id)
            .bind(response)
            .execute(executor)
            .await?;
        Ok(())
    }
}
