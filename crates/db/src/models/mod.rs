//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and patches where the API accepts them

pub mod assignment;
pub mod audit;
pub mod course;
pub mod enrollment;
pub mod idempotency;
pub mod progress;
pub mod questionnaire;
pub mod response;
