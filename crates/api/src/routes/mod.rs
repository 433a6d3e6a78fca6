pub mod assignment;
pub mod course;
pub mod health;
pub mod questionnaire;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /courses                                        POST create
/// /courses/{id}                                   GET detail + modules
/// /courses/{id}/modules                           POST create module
/// /courses/{id}/assignments                       GET list (owner)
/// /courses/{id}/enroll                            POST enroll
/// /courses/{id}/enrollment                        GET enrollment
/// /courses/{id}/access?module_id=                 GET gate decision
/// /courses/{id}/modules/{module_id}/complete      POST complete module
///
/// /questionnaires                                 GET list, POST create
/// /questionnaires/{id}                            GET detail, PUT new version
///
/// /assignments                                    POST create / re-bind
/// /assignments/{id}                               PATCH update, DELETE
/// /assignments/{id}/start                         GET frozen questions
/// /assignments/{id}/submit                        POST answers
/// /assignments/{id}/response                      GET own response
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/courses", course::router())
        .nest("/questionnaires", questionnaire::router())
        .nest("/assignments", assignment::router())
}
