//! `Idempotency-Key` header extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use syllabus_core::error::CoreError;
use syllabus_core::idempotency::{validate_key, IDEMPOTENCY_HEADER};

use crate::error::AppError;

/// The client-supplied idempotency key, if any. A present but malformed
/// key is rejected with 422 rather than silently ignored.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(pub Option<String>);

impl IdempotencyKey {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(IDEMPOTENCY_HEADER) else {
            return Ok(Self(None));
        };
        let key = raw.to_str().map_err(|_| {
            AppError::Core(CoreError::Validation(
                "Idempotency key must be printable ASCII without spaces".into(),
            ))
        })?;
        validate_key(key)?;
        Ok(Self(Some(key.to_string())))
    }
}
