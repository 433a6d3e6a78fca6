//! Questionnaire response model.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use syllabus_core::grading::{Answer, Score};
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `responses` table. Unique per (uid, assignment_id).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Response {
    pub id: DbId,
    pub uid: Uid,
    pub assignment_id: DbId,
    pub questionnaire_id: DbId,
    pub questionnaire_version: i32,
    pub scope_type: String,
    pub course_id: DbId,
    pub module_id: Option<DbId>,
    pub answers: Json<Vec<Answer>>,
    pub is_complete: bool,
    #[serde(skip)]
    pub score_earned: Option<i32>,
    #[serde(skip)]
    pub score_total: Option<i32>,
    pub submitted_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Response {
    /// `None` for responses to unscored questionnaires.
    pub fn score(&self) -> Option<Score> {
        match (self.score_earned, self.score_total) {
            (Some(earned), Some(total)) => Some(Score { earned, total }),
            _ => None,
        }
    }
}

/// Values written by the grader.
#[derive(Debug)]
pub struct UpsertResponse<'a> {
    pub uid: &'a str,
    pub assignment_id: DbId,
    pub questionnaire_id: DbId,
    pub questionnaire_version: i32,
    pub scope_type: &'a str,
    pub course_id: DbId,
    pub module_id: Option<DbId>,
    pub answers: &'a [Answer],
    pub score: Option<Score>,
}
