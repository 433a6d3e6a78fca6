use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An assignment's course cannot be changed after creation.
    #[error("Assignments cannot be moved to a different course")]
    CourseChangeDenied,

    #[error("Module {module_id} does not belong to course {course_id}")]
    ModuleCourseMismatch { module_id: DbId, course_id: DbId },

    /// A destructive operation was refused because dependent records exist.
    #[error("Has dependents: {0}")]
    HasDependents(String),

    /// Access refused until the listed assignments are completed.
    #[error("Blocked by {} incomplete assignment(s)", blocking.len())]
    GateBlocked { blocking: Vec<DbId> },

    #[error("Internal error: {0}")]
    Internal(String),
}
