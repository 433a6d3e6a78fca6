//! Audit trail writer.
//!
//! [`AuditPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every [`LearningEvent`] to `audit_logs`. Write failures are
//! logged and dropped: the audit trail never affects the operation that
//! produced the event.

use syllabus_core::types::DbId;
use syllabus_db::models::audit::CreateAuditLog;
use syllabus_db::repositories::AuditLogRepo;
use syllabus_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::LearningEvent;

/// Background service that persists learning events.
pub struct AuditPersistence;

impl AuditPersistence {
    /// Run until the bus is dropped.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<LearningEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to write audit log entry"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Audit persistence lagged, events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, audit persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &LearningEvent) -> Result<DbId, sqlx::Error> {
        let entry = CreateAuditLog {
            event_type: &event.event_type,
            entity_type: event.source_entity_type.as_deref(),
            entity_id: event.source_entity_id,
            actor_uid: event.actor_uid.as_deref(),
            payload: &event.payload,
            occurred_at: event.timestamp,
        };
        AuditLogRepo::insert(pool, &entry).await.map(|row| row.id)
    }
}
