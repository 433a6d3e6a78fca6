//! Durable deduplication of retried mutations.
//!
//! [`begin`] claims `(uid, operation, key)` inside the caller's transaction.
//! The unique index makes a concurrent second claimant wait for the first
//! transaction to finish: on commit it finds the stored result and replays
//! it, on rollback its own insert goes through and it executes normally.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::PgConnection;
use syllabus_core::error::CoreError;
use syllabus_core::idempotency::{ensure_same_request, request_fingerprint};
use syllabus_core::types::DbId;
use syllabus_db::repositories::IdempotencyRepo;

use crate::error::{AppError, AppResult};

/// Outcome of [`begin`].
#[derive(Debug)]
pub enum Begin<R> {
    /// Execute the operation, then call [`IdempotencyGuard::finish`].
    Proceed(IdempotencyGuard),
    /// The key was already used for this request; return the stored result.
    Replay(R),
}

/// An operation's result and whether it was replayed from a stored key.
#[derive(Debug)]
pub struct Executed<T> {
    pub outcome: T,
    pub replayed: bool,
}

impl<T> Executed<T> {
    pub fn fresh(outcome: T) -> Self {
        Self {
            outcome,
            replayed: false,
        }
    }

    pub fn replayed(outcome: T) -> Self {
        Self {
            outcome,
            replayed: true,
        }
    }
}

/// Holds a claimed key until the operation's result is stored.
#[derive(Debug)]
pub struct IdempotencyGuard {
    claimed: Option<DbId>,
}

/// Claim an idempotency key, or load the result stored under it.
///
/// Without a key the operation always proceeds.
pub async fn begin<Req, R>(
    conn: &mut PgConnection,
    uid: &str,
    operation: &str,
    key: Option<&str>,
    request: &Req,
) -> AppResult<Begin<R>>
where
    Req: Serialize,
    R: DeserializeOwned,
{
    let Some(key) = key else {
        return Ok(Begin::Proceed(IdempotencyGuard { claimed: None }));
    };

    let hash = request_fingerprint(request)?;
    if let Some(id) = IdempotencyRepo::try_claim(&mut *conn, uid, operation, key, &hash).await? {
        return Ok(Begin::Proceed(IdempotencyGuard { claimed: Some(id) }));
    }

    let record = IdempotencyRepo::find(&mut *conn, uid, operation, key)
        .await?
        .ok_or_else(|| AppError::InternalError("Idempotency key vanished after conflict".into()))?;
    ensure_same_request(&record.request_hash, &hash)?;

    let stored = record.response.ok_or_else(|| {
        CoreError::Conflict("A request with this idempotency key is still in progress".into())
    })?;
    let replay = serde_json::from_value(stored)
        .map_err(|e| AppError::InternalError(format!("Stored idempotent result is unreadable: {e}")))?;

    tracing::debug!(uid, operation, key, "Replaying stored idempotent result");
    Ok(Begin::Replay(replay))
}

impl IdempotencyGuard {
    /// Store the operation's result under the claimed key, if any.
    pub async fn finish<R: Serialize>(self, conn: &mut PgConnection, result: &R) -> AppResult<()> {
        let Some(id) = self.claimed else {
            return Ok(());
        };
        let value = serde_json::to_value(result)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {e}")))?;
        IdempotencyRepo::store_response(&mut *conn, id, &value).await?;
        Ok(())
    }
}
