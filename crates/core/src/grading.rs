//! Answer validation and scoring against a frozen question set.
//!
//! Everything here operates on the questions copied into an assignment,
//! never on the live template. Option ids from another version of the same
//! template are therefore rejected like any other unknown id.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::questionnaire::{Purpose, Question, QuestionType};

/// Upper bound on a free-text answer.
pub const MAX_TEXT_ANSWER_LENGTH: usize = 10_000;

/// One submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub earned: i32,
    pub total: i32,
}

/// Whether the value counts as an answer at all.
///
/// `null`, blank strings and empty arrays are treated as "not answered".
fn is_answered(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a submission against the frozen questions.
///
/// Fails on the first problem found, naming the offending question.
pub fn validate_answers(questions: &[Question], answers: &[Answer]) -> Result<(), CoreError> {
    let by_id: HashMap<&str, &Question> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut seen = HashSet::new();
    for answer in answers {
        let question = by_id.get(answer.question_id.as_str()).ok_or_else(|| {
            CoreError::Validation(format!("Unknown question id '{}'", answer.question_id))
        })?;
        if !seen.insert(answer.question_id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Question '{}' was answered more than once",
                answer.question_id
            )));
        }
        if is_answered(&answer.value) {
            validate_value(question, &answer.value)?;
        }
    }

    let answered = answer_map(answers);
    for q in questions.iter().filter(|q| q.required) {
        if !answered.contains_key(q.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Question '{}' is required",
                q.id
            )));
        }
    }
    Ok(())
}

fn validate_value(q: &Question, value: &Value) -> Result<(), CoreError> {
    let id = &q.id;
    match q.kind {
        QuestionType::Single => {
            let choice = value.as_str().ok_or_else(|| {
                CoreError::Validation(format!("Question '{id}' expects a single option id"))
            })?;
            if !q.has_option(choice) {
                return Err(CoreError::Validation(format!(
                    "Question '{id}': '{choice}' is not a valid option"
                )));
            }
        }
        QuestionType::Multi => {
            let items = value.as_array().ok_or_else(|| {
                CoreError::Validation(format!("Question '{id}' expects a list of option ids"))
            })?;
            let mut picked = HashSet::new();
            for item in items {
                let choice = item.as_str().ok_or_else(|| {
                    CoreError::Validation(format!("Question '{id}' expects a list of option ids"))
                })?;
                if !q.has_option(choice) {
                    return Err(CoreError::Validation(format!(
                        "Question '{id}': '{choice}' is not a valid option"
                    )));
                }
                if !picked.insert(choice) {
                    return Err(CoreError::Validation(format!(
                        "Question '{id}': option '{choice}' selected twice"
                    )));
                }
            }
        }
        QuestionType::Scale => {
            let n = value.as_f64().ok_or_else(|| {
                CoreError::Validation(format!("Question '{id}' expects a number"))
            })?;
            let range = q.scale.ok_or_else(|| {
                CoreError::Internal(format!("Question '{id}' has no scale bounds"))
            })?;
            if !range.contains(n) {
                return Err(CoreError::Validation(format!(
                    "Question '{id}': {n} is outside [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        QuestionType::Text => {
            let text = value.as_str().ok_or_else(|| {
                CoreError::Validation(format!("Question '{id}' expects text"))
            })?;
            if text.len() > MAX_TEXT_ANSWER_LENGTH {
                return Err(CoreError::Validation(format!(
                    "Question '{id}': answer exceeds {MAX_TEXT_ANSWER_LENGTH} characters"
                )));
            }
        }
    }
    Ok(())
}

fn answer_map(answers: &[Answer]) -> HashMap<&str, &Value> {
    answers
        .iter()
        .filter(|a| is_answered(&a.value))
        .map(|a| (a.question_id.as_str(), &a.value))
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score validated answers. Returns `None` when nothing is scored.
///
/// Survey purpose: an answered scored question earns its points outright.
/// Quiz/assessment: single must match an accepted option, multi must equal
/// the accepted set exactly, scale/text compare case-insensitively against
/// any accepted value.
pub fn score_answers(
    purpose: Purpose,
    questions: &[Question],
    answers: &[Answer],
) -> Result<Option<Score>, CoreError> {
    let answered = answer_map(answers);
    let mut score = Score { earned: 0, total: 0 };

    for q in questions.iter().filter(|q| q.is_scored()) {
        score.total = add_points(score.total, q.points)?;
        let Some(value) = answered.get(q.id.as_str()) else {
            continue;
        };
        if !purpose.is_graded() || is_correct(q, value) {
            score.earned = add_points(score.earned, q.points)?;
        }
    }

    Ok((score.total > 0).then_some(score))
}

fn add_points(sum: i32, points: i32) -> Result<i32, CoreError> {
    sum.checked_add(points)
        .ok_or_else(|| CoreError::Validation("Questionnaire point total is too large".into()))
}

fn is_correct(q: &Question, value: &Value) -> bool {
    match q.kind {
        QuestionType::Single => value
            .as_str()
            .is_some_and(|v| q.correct.iter().any(|c| c == v)),
        QuestionType::Multi => {
            let Some(items) = value.as_array() else {
                return false;
            };
            let submitted: HashSet<&str> = items.iter().filter_map(Value::as_str).collect();
            let expected: HashSet<&str> = q.correct.iter().map(String::as_str).collect();
            submitted == expected
        }
        QuestionType::Scale | QuestionType::Text => match normalize_scalar(value) {
            Some(v) => q.correct.iter().any(|c| c.to_lowercase() == v),
            None => false,
        },
    }
}

/// Lower-cased string form used for scale/text comparison. Whole numbers
/// drop the fractional part so `3.0` matches an accepted `"3"`.
fn normalize_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_lowercase()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}

/// Validate then score in one step.
pub fn grade(
    purpose: Purpose,
    questions: &[Question],
    answers: &[Answer],
) -> Result<Option<Score>, CoreError> {
    validate_answers(questions, answers)?;
    score_answers(purpose, questions, answers)
}
