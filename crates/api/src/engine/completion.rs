//! Enrollment and module completion.
//!
//! `complete_module` is the other entry point that mutates enrollment
//! aggregates. It takes the enrollment row lock before anything else, so
//! retries and concurrent completions of the same module serialize and the
//! later one sees the module already completed.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use syllabus_core::error::CoreError;
use syllabus_core::idempotency::operations;
use syllabus_core::progress::apply_module_completion;
use syllabus_core::scope::{ensure_module_in_course, AccessTarget};
use syllabus_core::types::DbId;
use syllabus_db::models::enrollment::Enrollment;
use syllabus_db::repositories::{CourseRepo, EnrollmentRepo, ModuleRepo, ProgressRepo};

use super::gate::can_access;
use super::idempotency::{self, Begin, Executed};
use crate::error::{AppError, AppResult};

/// Result of [`enroll`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollOutcome {
    pub enrollment: Enrollment,
    /// False when the learner was already enrolled.
    pub created: bool,
}

/// Enrollment aggregates after a module completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCompletion {
    pub course_id: DbId,
    pub module_id: DbId,
    pub progress_pct: i32,
    pub completed: bool,
    pub completed_count: i32,
    pub last_module_index: i32,
    /// The module was already completed; no counter changed.
    pub was_already_completed: bool,
    /// This call flipped the enrollment to completed.
    pub course_completed_now: bool,
}

impl ModuleCompletion {
    fn from_enrollment(enrollment: &Enrollment, module_id: DbId) -> Self {
        Self {
            course_id: enrollment.course_id,
            module_id,
            progress_pct: enrollment.progress_pct,
            completed: enrollment.completed,
            completed_count: enrollment.completed_count,
            last_module_index: enrollment.last_module_index,
            was_already_completed: false,
            course_completed_now: false,
        }
    }
}

#[derive(Serialize)]
struct EnrollFingerprint {
    course_id: DbId,
}

#[derive(Serialize)]
struct CompleteFingerprint {
    course_id: DbId,
    module_id: DbId,
    module_index: Option<i32>,
}

/// Enroll `uid` in a course. Re-enrolling returns the existing record.
pub async fn enroll(
    pool: &PgPool,
    uid: &str,
    course_id: DbId,
    idempotency_key: Option<&str>,
) -> AppResult<Executed<EnrollOutcome>> {
    let mut tx = pool.begin().await?;

    let guard = match idempotency::begin::<_, EnrollOutcome>(
        &mut tx,
        uid,
        operations::ENROLL,
        idempotency_key,
        &EnrollFingerprint { course_id },
    )
    .await?
    {
        Begin::Proceed(guard) => guard,
        Begin::Replay(outcome) => return Ok(Executed::replayed(outcome)),
    };

    CourseRepo::find_by_id(&mut *tx, course_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Course",
            id: course_id,
        })?;

    let (enrollment, created) = EnrollmentRepo::create_if_absent(&mut *tx, uid, course_id).await?;
    let outcome = EnrollOutcome {
        enrollment,
        created,
    };
    guard.finish(&mut tx, &outcome).await?;

    tx.commit().await?;
    Ok(Executed::fresh(outcome))
}

/// The caller's own enrollment in a course.
pub async fn get_enrollment(pool: &PgPool, uid: &str, course_id: DbId) -> AppResult<Enrollment> {
    EnrollmentRepo::find(pool, uid, course_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Enrollment",
                id: course_id,
            }
            .into()
        })
}

/// Mark a module completed and recompute the enrollment aggregates.
///
/// `module_index` defaults to the module's position and must match it when
/// given. A replay for an already-completed module returns the current
/// aggregates with `was_already_completed` set and changes nothing. A first
/// completion must pass the module's gate.
pub async fn complete_module(
    pool: &PgPool,
    uid: &str,
    course_id: DbId,
    module_id: DbId,
    module_index: Option<i32>,
    idempotency_key: Option<&str>,
) -> AppResult<Executed<ModuleCompletion>> {
    let mut tx = pool.begin().await?;

    let fingerprint = CompleteFingerprint {
        course_id,
        module_id,
        module_index,
    };
    let guard = match idempotency::begin::<_, ModuleCompletion>(
        &mut tx,
        uid,
        operations::COMPLETE_MODULE,
        idempotency_key,
        &fingerprint,
    )
    .await?
    {
        Begin::Proceed(guard) => guard,
        Begin::Replay(outcome) => return Ok(Executed::replayed(outcome)),
    };

    let enrollment = EnrollmentRepo::find_for_update(&mut *tx, uid, course_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Enrollment",
            id: course_id,
        })?;

    let module = ModuleRepo::find_by_id(&mut *tx, module_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Module",
            id: module_id,
        })?;
    ensure_module_in_course(module.id, module.course_id, course_id)?;

    let index = module_index.unwrap_or(module.position);
    if index < 0 || index != module.position {
        return Err(CoreError::Validation(format!(
            "module_index {index} does not match module {module_id} at position {}",
            module.position
        ))
        .into());
    }

    ProgressRepo::ensure_row(&mut *tx, uid, course_id, module_id).await?;
    let progress = ProgressRepo::find_for_update(&mut *tx, uid, course_id, module_id)
        .await?
        .ok_or_else(|| AppError::InternalError("Progress row missing after insert".into()))?;

    let outcome = if progress.completed {
        ModuleCompletion {
            was_already_completed: true,
            ..ModuleCompletion::from_enrollment(&enrollment, module_id)
        }
    } else {
        let target = AccessTarget {
            course_id,
            module_id: Some(module_id),
        };
        let decision = can_access(&mut tx, uid, &target).await?;
        if !decision.allowed {
            return Err(CoreError::GateBlocked {
                blocking: decision.blocking_ids(),
            }
            .into());
        }

        let total_modules = ModuleRepo::count_by_course(&mut *tx, course_id).await?;
        ProgressRepo::mark_completed(&mut *tx, progress.id).await?;

        let transition = apply_module_completion(&enrollment.progress(), index, total_modules);
        let updated = EnrollmentRepo::update_progress(&mut *tx, enrollment.id, &transition.next).await?;
        if transition.course_completed_now {
            CourseRepo::increment_completion_count(&mut *tx, course_id).await?;
        }

        ModuleCompletion {
            course_completed_now: transition.course_completed_now,
            ..ModuleCompletion::from_enrollment(&updated, module_id)
        }
    };

    guard.finish(&mut tx, &outcome).await?;
    tx.commit().await?;
    Ok(Executed::fresh(outcome))
}
