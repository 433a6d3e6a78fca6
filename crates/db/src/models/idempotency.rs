//! Idempotency key records.

use sqlx::FromRow;
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `idempotency_keys` table.
#[derive(Debug, Clone, FromRow)]
pub struct IdempotencyRecord {
    pub id: DbId,
    pub uid: Uid,
    pub operation: String,
    pub idem_key: String,
    pub request_hash: String,
    /// Set in the same transaction that claimed the key.
    pub response: Option<serde_json::Value>,
    pub created_at: Timestamp,
}
