use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{course, learner};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(course::create_course))
        .route("/{id}", get(course::get_course))
        .route("/{id}/modules", post(course::create_module))
        .route("/{id}/assignments", get(course::list_assignments))
        .route("/{id}/enroll", post(learner::enroll))
        .route("/{id}/enrollment", get(learner::get_enrollment))
        .route("/{id}/access", get(learner::access))
        .route(
            "/{id}/modules/{module_id}/complete",
            post(learner::complete_module),
        )
}
