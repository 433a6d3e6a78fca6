use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::assignment;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(assignment::upsert_assignment))
        .route(
            "/{id}",
            patch(assignment::update_assignment).delete(assignment::delete_assignment),
        )
        .route("/{id}/start", get(assignment::start_assignment))
        .route("/{id}/submit", post(assignment::submit))
        .route("/{id}/response", get(assignment::get_response))
}
