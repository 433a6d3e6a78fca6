//! Domain logic for the questionnaire gating and grading engine.
//!
//! No database or HTTP dependencies: every function here works on
//! pre-loaded data so it can be unit tested in isolation.

pub mod error;
pub mod gate;
pub mod grading;
pub mod hashing;
pub mod idempotency;
pub mod progress;
pub mod questionnaire;
pub mod roles;
pub mod scope;
pub mod types;
