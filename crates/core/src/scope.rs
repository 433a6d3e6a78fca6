//! Assignment scopes, timings, and the invariants that bind them to a course.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const SCOPE_COURSE: &str = "course";
pub const SCOPE_MODULE: &str = "module";

pub const TIMING_PRE: &str = "pre";
pub const TIMING_POST: &str = "post";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    Course,
    Module,
}

impl ScopeType {
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            SCOPE_COURSE => Ok(Self::Course),
            SCOPE_MODULE => Ok(Self::Module),
            _ => Err(format!(
                "Invalid scope type '{s}'. Must be one of: {SCOPE_COURSE}, {SCOPE_MODULE}"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Course => SCOPE_COURSE,
            Self::Module => SCOPE_MODULE,
        }
    }
}

/// Whether an assignment gates entry (`pre`) or follows the content (`post`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Pre,
    Post,
}

impl Timing {
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            TIMING_PRE => Ok(Self::Pre),
            TIMING_POST => Ok(Self::Post),
            _ => Err(format!(
                "Invalid timing '{s}'. Must be one of: {TIMING_PRE}, {TIMING_POST}"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => TIMING_PRE,
            Self::Post => TIMING_POST,
        }
    }
}

/// The course (and optional module) an assignment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub course_id: DbId,
    #[serde(default)]
    pub module_id: Option<DbId>,
}

impl Scope {
    pub fn course(course_id: DbId) -> Self {
        Self {
            scope_type: ScopeType::Course,
            course_id,
            module_id: None,
        }
    }

    pub fn module(course_id: DbId, module_id: DbId) -> Self {
        Self {
            scope_type: ScopeType::Module,
            course_id,
            module_id: Some(module_id),
        }
    }

    /// Module scopes carry a module id; course scopes do not.
    pub fn validate_shape(&self) -> Result<(), CoreError> {
        match (self.scope_type, self.module_id) {
            (ScopeType::Module, None) => Err(CoreError::Validation(
                "scope.module_id is required for module-scoped assignments".into(),
            )),
            (ScopeType::Course, Some(_)) => Err(CoreError::Validation(
                "scope.module_id must be omitted for course-scoped assignments".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// What a learner is trying to enter: a course, or one module of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTarget {
    pub course_id: DbId,
    #[serde(default)]
    pub module_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Invariant checks
// ---------------------------------------------------------------------------

/// The caller must own the entity. Never reveals who does.
pub fn ensure_owner(owner_id: &str, caller_uid: &str, entity: &str) -> Result<(), CoreError> {
    if owner_id != caller_uid {
        return Err(CoreError::Forbidden(format!(
            "You do not have access to this {entity}"
        )));
    }
    Ok(())
}

/// A module-scoped assignment's module must live in `scope.course_id`.
pub fn ensure_module_in_course(
    module_id: DbId,
    module_course_id: DbId,
    scope_course_id: DbId,
) -> Result<(), CoreError> {
    if module_course_id != scope_course_id {
        return Err(CoreError::ModuleCourseMismatch {
            module_id,
            course_id: scope_course_id,
        });
    }
    Ok(())
}

/// An assignment's course is fixed at creation.
pub fn ensure_course_unchanged(existing: DbId, requested: DbId) -> Result<(), CoreError> {
    if existing != requested {
        return Err(CoreError::CourseChangeDenied);
    }
    Ok(())
}
