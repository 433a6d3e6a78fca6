//! Well-known role name constants.
//!
//! Roles are asserted by the identity provider in the `role` claim.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_INSTRUCTOR: &str = "instructor";
pub const ROLE_LEARNER: &str = "learner";

/// Whether the role may author courses, templates and assignments.
pub fn can_author(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_INSTRUCTOR
}
