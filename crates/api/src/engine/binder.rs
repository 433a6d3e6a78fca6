//! Assignment Binder: attaches a frozen template version to a scope.
//!
//! Every ownership and scope check runs before the first write. The
//! template's current version is copied into the assignment at bind time,
//! so later template edits never change what an assignment grades against.

use sqlx::{PgConnection, PgPool};
use syllabus_core::error::CoreError;
use syllabus_core::scope::{ensure_course_unchanged, ensure_module_in_course, ensure_owner, Scope};
use syllabus_core::types::DbId;
use syllabus_db::models::assignment::{
    Assignment, AssignmentBinding, UpdateAssignment, UpsertAssignment,
};
use syllabus_db::repositories::{
    AssignmentRepo, CourseRepo, ModuleRepo, QuestionnaireRepo, ResponseRepo,
};

use crate::error::AppResult;

/// Check that `caller` owns the scope's course and that a module scope
/// names a module of that course.
pub async fn verify_scope(conn: &mut PgConnection, caller: &str, scope: &Scope) -> AppResult<()> {
    scope.validate_shape()?;

    let course = CourseRepo::find_by_id(&mut *conn, scope.course_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Course",
            id: scope.course_id,
        })?;
    ensure_owner(&course.owner_id, caller, "course")?;

    if let Some(module_id) = scope.module_id {
        let module = ModuleRepo::find_by_id(&mut *conn, module_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Module",
                id: module_id,
            })?;
        ensure_module_in_course(module.id, module.course_id, scope.course_id)?;
    }
    Ok(())
}

/// Load an assignment under a row lock and check the caller owns it.
async fn load_owned_for_update(
    conn: &mut PgConnection,
    caller: &str,
    id: DbId,
) -> AppResult<Assignment> {
    let assignment = AssignmentRepo::find_for_update(&mut *conn, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Assignment",
            id,
        })?;
    ensure_owner(&assignment.owner_id, caller, "assignment")?;
    Ok(assignment)
}

/// Create an assignment, or re-bind an existing one to the template's
/// current version. Returns the stored row and whether it was created.
///
/// A re-bind keeps the stored `active` flag; a differing `active` in the
/// input is rejected.
pub async fn upsert_assignment(
    pool: &PgPool,
    caller: &str,
    input: &UpsertAssignment,
) -> AppResult<(Assignment, bool)> {
    let mut tx = pool.begin().await?;

    let existing = match input.assignment_id {
        Some(id) => {
            let existing = load_owned_for_update(&mut tx, caller, id).await?;
            ensure_course_unchanged(existing.course_id, input.scope.course_id)?;
            if input.active.is_some_and(|active| active != existing.active) {
                return Err(CoreError::Validation(
                    "active can only be changed through an assignment update".into(),
                )
                .into());
            }
            Some(existing)
        }
        None => None,
    };

    let template = QuestionnaireRepo::find_by_id(&mut *tx, input.questionnaire_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Questionnaire",
            id: input.questionnaire_id,
        })?;
    ensure_owner(&template.owner_id, caller, "questionnaire")?;

    verify_scope(&mut tx, caller, &input.scope).await?;

    let binding = AssignmentBinding {
        owner_id: caller,
        questionnaire_id: template.id,
        questionnaire_version: template.version,
        title: &template.title,
        purpose: &template.purpose,
        questions: &template.questions.0,
        scope: input.scope,
        timing: input.timing,
        active: match &existing {
            Some(existing) => existing.active,
            None => input.active.unwrap_or(true),
        },
    };

    let (assignment, created) = match existing {
        Some(existing) => (
            AssignmentRepo::rebind(&mut *tx, existing.id, &binding).await?,
            false,
        ),
        None => (AssignmentRepo::create(&mut *tx, &binding).await?, true),
    };

    tx.commit().await?;
    Ok((assignment, created))
}

/// Change scope, timing or the active flag. The frozen snapshot is kept.
///
/// Deactivation only affects future gate checks; recorded responses stay.
pub async fn update_assignment(
    pool: &PgPool,
    caller: &str,
    id: DbId,
    input: &UpdateAssignment,
) -> AppResult<Assignment> {
    let mut tx = pool.begin().await?;

    let existing = load_owned_for_update(&mut tx, caller, id).await?;

    let scope = match input.scope {
        Some(scope) => {
            ensure_course_unchanged(existing.course_id, scope.course_id)?;
            verify_scope(&mut tx, caller, &scope).await?;
            scope
        }
        None => existing.scope()?,
    };
    let timing = match input.timing {
        Some(timing) => timing,
        None => existing.timing()?,
    };
    let active = input.active.unwrap_or(existing.active);

    let updated = AssignmentRepo::update_fields(&mut *tx, id, &scope, timing, active).await?;

    tx.commit().await?;
    Ok(updated)
}

/// Hard-delete an assignment that has no responses.
///
/// The row lock taken here conflicts with the key-share lock a response
/// insert takes on its assignment, so a racing submission either lands
/// first (and the count sees it) or waits for the delete and then fails
/// its foreign key check.
pub async fn delete_assignment(pool: &PgPool, caller: &str, id: DbId) -> AppResult<Assignment> {
    let mut tx = pool.begin().await?;

    let existing = load_owned_for_update(&mut tx, caller, id).await?;

    let responses = ResponseRepo::count_by_assignment(&mut *tx, id).await?;
    if responses > 0 {
        return Err(CoreError::HasDependents(format!(
            "Assignment {id} has {responses} response(s); deactivate it instead"
        ))
        .into());
    }

    AssignmentRepo::delete(&mut *tx, id).await?;

    tx.commit().await?;
    Ok(existing)
}
