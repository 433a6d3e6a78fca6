//! Assignment models.
//!
//! The row carries a full copy of the questionnaire version it was bound
//! to, so grading never consults the live template.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use syllabus_core::error::CoreError;
use syllabus_core::gate::Gated;
use syllabus_core::questionnaire::{Purpose, Question};
use syllabus_core::scope::{Scope, ScopeType, Timing};
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `assignments` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Assignment {
    pub id: DbId,
    pub owner_id: Uid,
    pub questionnaire_id: DbId,
    pub questionnaire_version: i32,
    pub title: String,
    pub purpose: String,
    pub questions: Json<Vec<Question>>,
    pub scope_type: String,
    pub course_id: DbId,
    pub module_id: Option<DbId>,
    pub timing: String,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Assignment {
    pub fn scope(&self) -> Result<Scope, CoreError> {
        Ok(Scope {
            scope_type: ScopeType::from_str_value(&self.scope_type).map_err(CoreError::Internal)?,
            course_id: self.course_id,
            module_id: self.module_id,
        })
    }

    pub fn timing(&self) -> Result<Timing, CoreError> {
        Timing::from_str_value(&self.timing).map_err(CoreError::Internal)
    }

    pub fn purpose(&self) -> Result<Purpose, CoreError> {
        Purpose::from_str_value(&self.purpose).map_err(CoreError::Internal)
    }
}

/// Learner-safe projection used in gate decisions. No questions, no keys.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssignmentSummary {
    pub id: DbId,
    pub questionnaire_id: DbId,
    pub questionnaire_version: i32,
    pub title: String,
    pub scope_type: String,
    pub course_id: DbId,
    pub module_id: Option<DbId>,
    pub timing: String,
    pub active: bool,
}

impl Gated for AssignmentSummary {
    fn gate_id(&self) -> DbId {
        self.id
    }

    fn gate_scope(&self) -> Scope {
        let scope_type = match self.module_id {
            Some(_) => ScopeType::Module,
            None => ScopeType::Course,
        };
        Scope {
            scope_type,
            course_id: self.course_id,
            module_id: self.module_id,
        }
    }

    fn gate_timing(&self) -> Timing {
        // Column is constrained to 'pre' | 'post'.
        Timing::from_str_value(&self.timing).unwrap_or(Timing::Post)
    }

    fn gate_active(&self) -> bool {
        self.active
    }
}

/// Body for `upsertAssignment`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAssignment {
    pub assignment_id: Option<DbId>,
    pub questionnaire_id: DbId,
    pub scope: Scope,
    pub timing: Timing,
    pub active: Option<bool>,
}

/// Body for `updateAssignment`. Only present fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssignment {
    pub scope: Option<Scope>,
    pub timing: Option<Timing>,
    pub active: Option<bool>,
}

/// Values written when binding an assignment to a template version.
#[derive(Debug)]
pub struct AssignmentBinding<'a> {
    pub owner_id: &'a str,
    pub questionnaire_id: DbId,
    pub questionnaire_version: i32,
    pub title: &'a str,
    pub purpose: &'a str,
    pub questions: &'a [Question],
    pub scope: Scope,
    pub timing: Timing,
    pub active: bool,
}
