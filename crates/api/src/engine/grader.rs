//! Submission Grader: serve and grade an assignment's frozen questions.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use syllabus_core::error::CoreError;
use syllabus_core::grading::{grade, Answer, Score};
use syllabus_core::idempotency::operations;
use syllabus_core::questionnaire::PublicQuestion;
use syllabus_core::scope::{Scope, Timing};
use syllabus_core::types::{DbId, Timestamp};
use syllabus_db::models::assignment::Assignment;
use syllabus_db::models::response::UpsertResponse;
use syllabus_db::repositories::{AssignmentRepo, ResponseRepo};

use super::idempotency::{self, Begin, Executed};
use super::propagator::propagate_submission;
use crate::error::AppResult;

/// The learner's view of an assignment. Answer keys are never included.
#[derive(Debug, Serialize)]
pub struct StartedAssignment {
    pub assignment_id: DbId,
    pub questionnaire_id: DbId,
    pub questionnaire_version: i32,
    pub title: String,
    pub purpose: String,
    pub scope: Scope,
    pub timing: Timing,
    pub questions: Vec<PublicQuestion>,
    /// The learner already has a completed response.
    pub completed: bool,
}

/// Result of a submission, also stored under its idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub response_id: DbId,
    pub assignment_id: DbId,
    pub questionnaire_version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    pub is_complete: bool,
    /// True when this submission replaced an earlier response.
    pub resubmitted: bool,
    /// The submission finished the course.
    pub course_completed: bool,
    pub submitted_at: Timestamp,
}

/// Request shape fingerprinted for idempotency keys.
#[derive(Serialize)]
struct SubmitFingerprint<'a> {
    assignment_id: DbId,
    answers: &'a [Answer],
}

fn ensure_active(assignment: &Assignment) -> AppResult<()> {
    if !assignment.active {
        return Err(CoreError::Conflict(format!(
            "Assignment {} is not active",
            assignment.id
        ))
        .into());
    }
    Ok(())
}

/// Load an active assignment's frozen questions for a learner.
pub async fn start_assignment(
    pool: &PgPool,
    uid: &str,
    assignment_id: DbId,
) -> AppResult<StartedAssignment> {
    let assignment = AssignmentRepo::find_by_id(pool, assignment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Assignment",
            id: assignment_id,
        })?;
    ensure_active(&assignment)?;

    let completed = ResponseRepo::find_for_user(pool, uid, assignment_id)
        .await?
        .is_some_and(|r| r.is_complete);

    Ok(StartedAssignment {
        assignment_id: assignment.id,
        questionnaire_id: assignment.questionnaire_id,
        questionnaire_version: assignment.questionnaire_version,
        scope: assignment.scope()?,
        timing: assignment.timing()?,
        questions: assignment.questions.0.iter().map(|q| q.public_view()).collect(),
        title: assignment.title,
        purpose: assignment.purpose,
        completed,
    })
}

/// Validate, score and record a submission, then propagate its flags.
///
/// The response upsert, flag propagation and idempotency record commit in
/// one transaction. Resubmitting overwrites the single response for
/// `(uid, assignment_id)`.
pub async fn submit(
    pool: &PgPool,
    uid: &str,
    assignment_id: DbId,
    answers: &[Answer],
    idempotency_key: Option<&str>,
) -> AppResult<Executed<SubmitOutcome>> {
    let mut tx = pool.begin().await?;

    let fingerprint = SubmitFingerprint {
        assignment_id,
        answers,
    };
    let guard = match idempotency::begin::<_, SubmitOutcome>(
        &mut tx,
        uid,
        operations::SUBMIT,
        idempotency_key,
        &fingerprint,
    )
    .await?
    {
        Begin::Proceed(guard) => guard,
        Begin::Replay(outcome) => return Ok(Executed::replayed(outcome)),
    };

    let assignment = AssignmentRepo::find_by_id(&mut *tx, assignment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Assignment",
            id: assignment_id,
        })?;
    ensure_active(&assignment)?;

    let score = grade(assignment.purpose()?, &assignment.questions.0, answers)?;

    let (response, created) = ResponseRepo::upsert(
        &mut *tx,
        &UpsertResponse {
            uid,
            assignment_id,
            questionnaire_id: assignment.questionnaire_id,
            questionnaire_version: assignment.questionnaire_version,
            scope_type: &assignment.scope_type,
            course_id: assignment.course_id,
            module_id: assignment.module_id,
            answers,
            score,
        },
    )
    .await?;

    let propagation = propagate_submission(&mut tx, uid, &assignment).await?;

    let outcome = SubmitOutcome {
        response_id: response.id,
        assignment_id,
        questionnaire_version: response.questionnaire_version,
        score: response.score(),
        is_complete: response.is_complete,
        resubmitted: !created,
        course_completed: propagation.course_completed_now,
        submitted_at: response.submitted_at,
    };
    guard.finish(&mut tx, &outcome).await?;

    tx.commit().await?;
    Ok(Executed::fresh(outcome))
}
