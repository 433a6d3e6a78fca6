use axum::routing::get;
use axum::Router;

use crate::handlers::questionnaire;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(questionnaire::list_templates).post(questionnaire::create_template),
        )
        .route(
            "/{id}",
            get(questionnaire::get_template).put(questionnaire::update_template),
        )
}
