//! Role-based access control extractors.
//!
//! Roles only gate which endpoints a caller may reach. Ownership of the
//! course, template or assignment is still checked by the engine.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use syllabus_core::error::CoreError;
use syllabus_core::roles::can_author;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires `instructor` or `admin` role. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn author_only(RequireInstructor(user): RequireInstructor) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireInstructor(pub AuthUser);

impl FromRequestParts<AppState> for RequireInstructor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_author(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Instructor or Admin role required".into(),
            )));
        }
        Ok(RequireInstructor(user))
    }
}
