//! Enrollment model: per-learner course aggregates and gating flags.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use syllabus_core::progress::EnrollmentProgress;
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `enrollments` table. Unique per (uid, course_id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: DbId,
    pub uid: Uid,
    pub course_id: DbId,
    pub completed_count: i32,
    pub progress_pct: i32,
    pub last_module_index: i32,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub pre_course_complete: bool,
    pub post_course_complete: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Enrollment {
    pub fn progress(&self) -> EnrollmentProgress {
        EnrollmentProgress {
            completed_count: self.completed_count,
            progress_pct: self.progress_pct,
            last_module_index: self.last_module_index,
            completed: self.completed,
        }
    }
}

/// Which course-level gating flag a submission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseFlag {
    PreCourseComplete,
    PostCourseComplete,
}

impl CourseFlag {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::PreCourseComplete => "pre_course_complete",
            Self::PostCourseComplete => "post_course_complete",
        }
    }
}
