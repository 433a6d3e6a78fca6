use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and the rest is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: syllabus_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Learning events published after successful mutations.
    pub event_bus: Arc<syllabus_events::EventBus>,
}
