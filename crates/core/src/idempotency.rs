//! Client-supplied idempotency keys.
//!
//! A key is scoped by (uid, operation). The stored record carries a
//! fingerprint of the request so that reusing a key for a different
//! request is refused instead of replaying an unrelated result.

use serde::Serialize;

use crate::error::CoreError;
use crate::hashing::sha256_hex;

/// Request header carrying the key.
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

pub const MAX_KEY_LENGTH: usize = 255;

/// Operation names used to scope keys.
pub mod operations {
    pub const ENROLL: &str = "enroll";
    pub const COMPLETE_MODULE: &str = "complete_module";
    pub const SUBMIT: &str = "submit";
}

/// Keys are 1..=255 printable ASCII characters without spaces.
pub fn validate_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Idempotency key must be 1-{MAX_KEY_LENGTH} characters"
        )));
    }
    if !key.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(CoreError::Validation(
            "Idempotency key must be printable ASCII without spaces".into(),
        ));
    }
    Ok(())
}

/// SHA-256 fingerprint of the canonical JSON form of a request.
pub fn request_fingerprint<T: Serialize>(request: &T) -> Result<String, CoreError> {
    let bytes = serde_json::to_vec(request)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize request: {e}")))?;
    Ok(sha256_hex(&bytes))
}

/// A replayed key must carry the same request it was first used with.
pub fn ensure_same_request(stored: &str, current: &str) -> Result<(), CoreError> {
    if stored != current {
        return Err(CoreError::Conflict(
            "Idempotency key was already used for a different request".into(),
        ));
    }
    Ok(())
}
