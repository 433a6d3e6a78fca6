//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` in the API state. Publishing
//! never blocks and never fails the request that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use syllabus_core::types::DbId;
use tokio::sync::broadcast;

/// Event names published by the engine.
pub mod event_types {
    pub const TEMPLATE_SAVED: &str = "template.saved";
    pub const ASSIGNMENT_SAVED: &str = "assignment.saved";
    pub const ASSIGNMENT_DELETED: &str = "assignment.deleted";
    pub const RESPONSE_SUBMITTED: &str = "response.submitted";
    pub const MODULE_COMPLETED: &str = "module.completed";
    pub const COURSE_COMPLETED: &str = "course.completed";
    pub const ENROLLMENT_CREATED: &str = "enrollment.created";
}

// ---------------------------------------------------------------------------
// LearningEvent
// ---------------------------------------------------------------------------

/// Something that happened to a template, assignment or learner record.
///
/// Built with [`LearningEvent::new`] and the `with_*` builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    /// Dot-separated event name, e.g. `"response.submitted"`.
    pub event_type: String,

    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<DbId>,

    /// Identity-provider uid of the caller.
    pub actor_uid: Option<String>,

    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl LearningEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_uid: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, uid: impl Into<String>) -> Self {
        self.actor_uid = Some(uid.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest unconsumed events are dropped and
/// slow receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<LearningEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: LearningEvent) {
        // Only fails when there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LearningEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
