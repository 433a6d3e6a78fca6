//! Completion Propagator: gating flags set by a completed submission.
//!
//! Runs inside the grader's transaction, after the response upsert.

use sqlx::PgConnection;
use syllabus_core::error::CoreError;
use syllabus_core::progress::post_course_completes;
use syllabus_core::scope::{ScopeType, Timing};
use syllabus_db::models::assignment::Assignment;
use syllabus_db::models::enrollment::CourseFlag;
use syllabus_db::models::progress::ModuleFlag;
use syllabus_db::repositories::{CourseRepo, EnrollmentRepo, ModuleRepo, ProgressRepo};

use crate::error::{AppError, AppResult};

/// What a submission changed beyond the response itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Propagation {
    /// The enrollment's `completed` flag flipped in this transaction.
    pub course_completed_now: bool,
}

/// Apply the `(scope, timing)` flag for a completed submission.
///
/// Course-scoped flags merge into the enrollment, creating it if absent.
/// A post-course submission can also finish the course when every module
/// is already done; that flip and the course counter bump happen at most
/// once per enrollment because both run under the enrollment row lock.
pub async fn propagate_submission(
    conn: &mut PgConnection,
    uid: &str,
    assignment: &Assignment,
) -> AppResult<Propagation> {
    let scope = assignment.scope()?;
    let timing = assignment.timing()?;

    match (scope.scope_type, timing) {
        (ScopeType::Course, Timing::Pre) => {
            let (enrollment, _) =
                EnrollmentRepo::create_if_absent(&mut *conn, uid, scope.course_id).await?;
            EnrollmentRepo::set_flag(&mut *conn, enrollment.id, CourseFlag::PreCourseComplete)
                .await?;
            Ok(Propagation::default())
        }
        (ScopeType::Course, Timing::Post) => {
            EnrollmentRepo::create_if_absent(&mut *conn, uid, scope.course_id).await?;
            let enrollment = EnrollmentRepo::find_for_update(&mut *conn, uid, scope.course_id)
                .await?
                .ok_or_else(|| AppError::InternalError("Enrollment missing after upsert".into()))?;
            EnrollmentRepo::set_flag(&mut *conn, enrollment.id, CourseFlag::PostCourseComplete)
                .await?;

            let total_modules = ModuleRepo::count_by_course(&mut *conn, scope.course_id).await?;
            if !post_course_completes(&enrollment.progress(), total_modules) {
                return Ok(Propagation::default());
            }

            let flipped = EnrollmentRepo::mark_completed(&mut *conn, enrollment.id).await?;
            if flipped.is_some() {
                CourseRepo::increment_completion_count(&mut *conn, scope.course_id).await?;
            }
            Ok(Propagation {
                course_completed_now: flipped.is_some(),
            })
        }
        (ScopeType::Module, timing) => {
            let module_id = scope.module_id.ok_or_else(|| {
                CoreError::Internal(format!("Assignment {} has no module", assignment.id))
            })?;
            let flag = match timing {
                Timing::Pre => ModuleFlag::PreModuleComplete,
                Timing::Post => ModuleFlag::PostModuleComplete,
            };
            ProgressRepo::set_flag(&mut *conn, uid, scope.course_id, module_id, flag).await?;
            Ok(Propagation::default())
        }
    }
}
