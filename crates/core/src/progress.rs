//! Enrollment progress arithmetic.
//!
//! Transition functions only; the caller holds the enrollment row lock and
//! decides from the returned flags which counters to bump.

use serde::Serialize;

/// Aggregate counters carried on an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnrollmentProgress {
    pub completed_count: i32,
    pub progress_pct: i32,
    /// Resume pointer, stored as "module index + 1".
    pub last_module_index: i32,
    pub completed: bool,
}

impl EnrollmentProgress {
    pub fn empty() -> Self {
        Self {
            completed_count: 0,
            progress_pct: 0,
            last_module_index: 0,
            completed: false,
        }
    }
}

/// Result of applying one module completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionTransition {
    pub next: EnrollmentProgress,
    /// `completed` went from false to true in this transition.
    pub course_completed_now: bool,
}

/// `floor(100 * completed / total)`, clamped to `[0, 100]`.
pub fn progress_pct(completed_count: i32, total_modules: i32) -> i32 {
    if total_modules <= 0 {
        return 0;
    }
    let pct = (100 * i64::from(completed_count.max(0))) / i64::from(total_modules);
    pct.clamp(0, 100) as i32
}

/// Advance the resume pointer: `min(total, max(previous, index + 1))`.
///
/// Tracks the highest index seen, so completing module 3 before module 2
/// moves the pointer past the gap.
pub fn advance_resume_pointer(previous: i32, module_index: i32, total_modules: i32) -> i32 {
    previous.max(module_index + 1).min(total_modules)
}

/// Apply a first-time module completion to the enrollment counters.
///
/// Replays must not reach this function; the caller checks the progress
/// row's `completed` flag first.
pub fn apply_module_completion(
    prev: &EnrollmentProgress,
    module_index: i32,
    total_modules: i32,
) -> CompletionTransition {
    let completed_count = prev.completed_count + 1;
    let completed = prev.completed || completed_count >= total_modules;
    let next = EnrollmentProgress {
        completed_count,
        progress_pct: progress_pct(completed_count, total_modules),
        last_module_index: advance_resume_pointer(
            prev.last_module_index,
            module_index,
            total_modules,
        ),
        completed,
    };
    CompletionTransition {
        next,
        course_completed_now: !prev.completed && completed,
    }
}

/// Whether a completed post-course questionnaire finishes the course.
///
/// Every module up to the resume pointer must be done
/// (`completed_count == last_module_index`) and the pointer must have
/// reached the course's current module count.
pub fn post_course_completes(prev: &EnrollmentProgress, total_modules: i32) -> bool {
    !prev.completed
        && total_modules > 0
        && prev.completed_count == prev.last_module_index
        && prev.last_module_index >= total_modules
}
