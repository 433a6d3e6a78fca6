//! Axum handlers. Each one extracts the caller, delegates to the engine or
//! a repository, and publishes a [`syllabus_events::LearningEvent`] after a
//! successful mutation.

pub mod assignment;
pub mod course;
pub mod learner;
pub mod questionnaire;
