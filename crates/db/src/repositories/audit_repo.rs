//! Repository for the `audit_logs` table.

use sqlx::PgPool;
use syllabus_core::types::DbId;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list for `audit_logs` queries.
const COLUMNS: &str = "\
    id, event_type, entity_type, entity_id, actor_uid, payload, occurred_at, created_at";

/// Upper bound on rows returned by a single listing.
const MAX_LIMIT: i64 = 500;

/// Provides insert and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog<'_>) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (event_type, entity_type, entity_id, actor_uid, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.event_type)
            .bind(entry.entity_type)
            .bind(entry.entity_id)
            .bind(entry.actor_uid)
            .bind(entry.payload)
            .bind(entry.occurred_at)
            .fetch_one(pool)
            .await
    }

    /// Entries recorded for one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        limit: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY occurred_at DESC, id DESC LIMIT $3"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(limit.clamp(1, MAX_LIMIT))
            .fetch_all(pool)
            .await
    }
}
