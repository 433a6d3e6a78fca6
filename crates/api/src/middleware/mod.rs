//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the caller identity from the Bearer token.
//! - [`rbac::RequireInstructor`] -- requires `instructor` or `admin`.
//! - [`idempotency::IdempotencyKey`] -- the optional `Idempotency-Key` header.

pub mod auth;
pub mod idempotency;
pub mod rbac;
