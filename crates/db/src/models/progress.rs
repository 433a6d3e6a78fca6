//! Per-module progress model.

use serde::Serialize;
use sqlx::FromRow;
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `progress` table. Unique per (uid, course_id, module_id).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Progress {
    pub id: DbId,
    pub uid: Uid,
    pub course_id: DbId,
    pub module_id: DbId,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub pre_module_complete: bool,
    pub post_module_complete: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Which per-module gating flag a submission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFlag {
    PreModuleComplete,
    PostModuleComplete,
}

impl ModuleFlag {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::PreModuleComplete => "pre_module_complete",
            Self::PostModuleComplete => "post_module_complete",
        }
    }
}
