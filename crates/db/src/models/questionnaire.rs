//! Questionnaire template models.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use syllabus_core::questionnaire::{Purpose, Question};
use syllabus_core::types::{DbId, Timestamp, Uid};

/// A row from the `questionnaires` table: the current version of a template.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Questionnaire {
    pub id: DbId,
    pub owner_id: Uid,
    pub title: String,
    pub purpose: String,
    pub version: i32,
    pub questions: Json<Vec<Question>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validated values written for a template version.
#[derive(Debug)]
pub struct TemplateVersionInput<'a> {
    pub title: &'a str,
    pub purpose: Purpose,
    pub version: i32,
    pub questions: &'a [Question],
}
