//! Audit log model.

use serde::Serialize;
use sqlx::FromRow;
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `audit_logs` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLog {
    pub id: DbId,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub actor_uid: Option<Uid>,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for inserting an audit entry.
#[derive(Debug)]
pub struct CreateAuditLog<'a> {
    pub event_type: &'a str,
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<DbId>,
    pub actor_uid: Option<&'a str>,
    pub payload: &'a serde_json::Value,
    pub occurred_at: Timestamp,
}
