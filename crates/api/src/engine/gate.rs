//! Gate Evaluator: may a learner enter a course or module?
//!
//! Loads the candidate gates and the learner's completed responses fresh on
//! every call, then defers to [`syllabus_core::gate::evaluate_gate`].

use std::collections::HashSet;

use sqlx::PgConnection;
use syllabus_core::error::CoreError;
use syllabus_core::gate::{evaluate_gate, GateDecision};
use syllabus_core::scope::{ensure_module_in_course, AccessTarget};
use syllabus_db::models::assignment::AssignmentSummary;
use syllabus_db::repositories::{AssignmentRepo, CourseRepo, ModuleRepo, ResponseRepo};

use crate::error::AppResult;

/// Evaluate the gate for `target`.
///
/// Fails with `NotFound` for an unknown course or module and with
/// `ModuleCourseMismatch` when the module belongs to another course.
pub async fn can_access(
    conn: &mut PgConnection,
    uid: &str,
    target: &AccessTarget,
) -> AppResult<GateDecision<AssignmentSummary>> {
    CourseRepo::find_by_id(&mut *conn, target.course_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Course",
            id: target.course_id,
        })?;

    if let Some(module_id) = target.module_id {
        let module = ModuleRepo::find_by_id(&mut *conn, module_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Module",
                id: module_id,
            })?;
        ensure_module_in_course(module.id, module.course_id, target.course_id)?;
    }

    let candidates =
        AssignmentRepo::list_gate_candidates(&mut *conn, target.course_id, target.module_id)
            .await?;
    let ids: Vec<_> = candidates.iter().map(|a| a.id).collect();
    let completed: HashSet<_> = ResponseRepo::completed_assignment_ids(&mut *conn, uid, &ids)
        .await?
        .into_iter()
        .collect();

    Ok(evaluate_gate(target, &candidates, &completed))
}
