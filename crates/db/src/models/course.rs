//! Course and module models.

use serde::Serialize;
use sqlx::FromRow;
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `courses` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: DbId,
    pub owner_id: Uid,
    pub title: String,
    /// Learners who have completed the course. Bumped once per enrollment.
    pub completion_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `modules` table. Ownership comes from the course.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Module {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    /// 0-based module index within the course.
    pub position: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
