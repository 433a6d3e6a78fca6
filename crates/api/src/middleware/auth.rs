//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use syllabus_core::error::CoreError;
use syllabus_core::types::Uid;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Caller identity extracted from the `Authorization: Bearer` token.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(uid = %auth.uid, role = %auth.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity-provider user id (from `claims.sub`).
    pub uid: Uid,
    pub email: Option<String>,
    pub role: String,
    pub provider: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let identity = &state.config.identity;
        let claims = validate_token(token, identity).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        if identity.is_blocked_provider(&claims.provider) {
            return Err(AppError::Core(CoreError::Unauthorized(format!(
                "Sign-in method '{}' is not allowed",
                claims.provider
            ))));
        }

        Ok(AuthUser {
            uid: claims.sub,
            email: claims.email,
            role: claims.role,
            provider: claims.provider,
        })
    }
}
