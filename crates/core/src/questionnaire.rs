//! Questionnaire templates: purposes, question shapes and versioning rules.
//!
//! A template is immutable per version. Assignments copy a version's
//! question set at bind time, so nothing here ever needs to look up an
//! older version live.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PURPOSE_SURVEY: &str = "survey";
pub const PURPOSE_QUIZ: &str = "quiz";
pub const PURPOSE_ASSESSMENT: &str = "assessment";

/// All valid purpose strings (as stored in the database).
pub const VALID_PURPOSES: &[&str] = &[PURPOSE_SURVEY, PURPOSE_QUIZ, PURPOSE_ASSESSMENT];

/// Maximum number of questions in a single template version.
pub const MAX_QUESTIONS: usize = 200;

/// Maximum number of options on a single/multi question.
pub const MAX_OPTIONS: usize = 50;

/// Upper bound on a single question's points. Keeps a full template's
/// total well inside `i32`.
pub const MAX_POINTS: i32 = 1000;

/// Points awarded for a scored question when the template omits `points`.
pub const DEFAULT_POINTS: i32 = 1;

/// First version assigned to a newly created template.
pub const INITIAL_VERSION: i32 = 1;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What a questionnaire is used for. Drives scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Survey,
    Quiz,
    /// Mixed survey/quiz content, graded like a quiz.
    #[serde(alias = "mixed")]
    Assessment,
}

impl Purpose {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            PURPOSE_SURVEY => Ok(Self::Survey),
            PURPOSE_QUIZ => Ok(Self::Quiz),
            PURPOSE_ASSESSMENT | "mixed" => Ok(Self::Assessment),
            _ => Err(format!(
                "Invalid purpose '{s}'. Must be one of: {}",
                VALID_PURPOSES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Survey => PURPOSE_SURVEY,
            Self::Quiz => PURPOSE_QUIZ,
            Self::Assessment => PURPOSE_ASSESSMENT,
        }
    }

    /// Whether answers are compared against `correct` keys.
    pub fn is_graded(&self) -> bool {
        !matches!(self, Self::Survey)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Single,
    Multi,
    Scale,
    Text,
}

impl QuestionType {
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Single | Self::Multi)
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
}

/// Inclusive numeric bounds for a `scale` question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: i64,
    pub max: i64,
}

impl ScaleRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min as f64 && value <= self.max as f64
    }
}

fn default_points() -> i32 {
    DEFAULT_POINTS
}

/// A single question within one template version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable within a version.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleRange>,
    #[serde(default)]
    pub required: bool,
    /// Accepted option ids (single/multi) or accepted values (scale/text).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correct: Vec<String>,
    #[serde(default = "default_points")]
    pub points: i32,
}

impl Question {
    /// A question contributes to the score total only when it has answer
    /// keys and a positive point value.
    pub fn is_scored(&self) -> bool {
        !self.correct.is_empty() && self.points > 0
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    /// The learner-facing view: answer keys are never included.
    pub fn public_view(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            kind: self.kind,
            prompt: self.prompt.clone(),
            options: self.options.clone(),
            scale: self.scale,
            required: self.required,
            points: self.points,
        }
    }
}

/// Question as served to learners by `start`.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleRange>,
    pub required: bool,
    pub points: i32,
}

/// Request body for creating or editing a template.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct UpsertTemplate {
    /// Present when editing an existing template.
    pub template_id: Option<DbId>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub purpose: Purpose,
    /// Client's view of the version. Must not be lower than the stored one.
    pub version: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub questions: Vec<Question>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a template body: field lengths, then question structure.
pub fn validate_template(input: &UpsertTemplate) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    validate_questions(&input.questions)
}

/// Validate the structure of an ordered question list.
pub fn validate_questions(questions: &[Question]) -> Result<(), CoreError> {
    if questions.is_empty() {
        return Err(CoreError::Validation(
            "A questionnaire must contain at least one question".into(),
        ));
    }
    if questions.len() > MAX_QUESTIONS {
        return Err(CoreError::Validation(format!(
            "A questionnaire may contain at most {MAX_QUESTIONS} questions"
        )));
    }

    let mut seen = HashSet::new();
    for q in questions {
        if q.id.trim().is_empty() {
            return Err(CoreError::Validation("Question id must not be empty".into()));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate question id '{}'",
                q.id
            )));
        }
        validate_question(q)?;
    }
    Ok(())
}

fn validate_question(q: &Question) -> Result<(), CoreError> {
    let id = &q.id;
    if q.prompt.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "Question '{id}': prompt must not be empty"
        )));
    }
    if !(0..=MAX_POINTS).contains(&q.points) {
        return Err(CoreError::Validation(format!(
            "Question '{id}': points must be between 0 and {MAX_POINTS}"
        )));
    }

    if q.kind.has_options() {
        if q.options.is_empty() {
            return Err(CoreError::Validation(format!(
                "Question '{id}': options are required for {:?} questions",
                q.kind
            )));
        }
        if q.options.len() > MAX_OPTIONS {
            return Err(CoreError::Validation(format!(
                "Question '{id}': at most {MAX_OPTIONS} options are allowed"
            )));
        }
        let mut option_ids = HashSet::new();
        for opt in &q.options {
            if opt.id.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Question '{id}': option id must not be empty"
                )));
            }
            if !option_ids.insert(opt.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Question '{id}': duplicate option id '{}'",
                    opt.id
                )));
            }
        }
        if let Some(bad) = q.correct.iter().find(|c| !option_ids.contains(c.as_str())) {
            return Err(CoreError::Validation(format!(
                "Question '{id}': correct value '{bad}' is not an option id"
            )));
        }
    } else if q.kind == QuestionType::Scale {
        let range = q.scale.ok_or_else(|| {
            CoreError::Validation(format!("Question '{id}': scale bounds are required"))
        })?;
        if range.min >= range.max {
            return Err(CoreError::Validation(format!(
                "Question '{id}': scale min must be less than max"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Resolve the version to store for a create (`current = None`) or edit.
///
/// Edits never reuse a version: the result is at least `current + 1`.
/// A supplied version lower than the stored one is a conflict.
pub fn next_version(current: Option<i32>, supplied: Option<i32>) -> Result<i32, CoreError> {
    match current {
        None => {
            let v = supplied.unwrap_or(INITIAL_VERSION);
            if v < INITIAL_VERSION {
                return Err(CoreError::Validation(format!(
                    "version must be at least {INITIAL_VERSION}"
                )));
            }
            Ok(v)
        }
        Some(cur) => {
            if let Some(v) = supplied {
                if v < cur {
                    return Err(CoreError::Conflict(format!(
                        "version {v} is older than the current version {cur}"
                    )));
                }
            }
            let bumped = cur.checked_add(1).ok_or_else(|| {
                CoreError::Conflict(format!("version {cur} cannot be incremented further"))
            })?;
            Ok(supplied.unwrap_or(0).max(bumped))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
