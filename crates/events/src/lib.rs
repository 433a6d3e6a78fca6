//! Learning event bus and audit trail.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`LearningEvent`]: the domain event envelope.
//! - [`AuditPersistence`]: background service writing every event to
//!   `audit_logs`.

pub mod bus;
pub mod persistence;

pub use bus::{event_types, EventBus, LearningEvent};
pub use persistence::AuditPersistence;
