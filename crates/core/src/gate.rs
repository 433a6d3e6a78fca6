//! Gate evaluation: may a learner enter a course or module?
//!
//! Pure function over pre-loaded assignments and the set of assignment ids
//! the learner has a completed response for. Callers load both fresh for
//! every check; nothing is cached.

use std::collections::HashSet;

use serde::Serialize;

use crate::scope::{AccessTarget, Scope, ScopeType, Timing};
use crate::types::DbId;

/// Anything that can act as a gate.
pub trait Gated {
    fn gate_id(&self) -> DbId;
    fn gate_scope(&self) -> Scope;
    fn gate_timing(&self) -> Timing;
    fn gate_active(&self) -> bool;
}

/// Outcome of a gate check.
#[derive(Debug, Clone, Serialize)]
pub struct GateDecision<A> {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub blocking: Vec<A>,
}

impl<A: Gated> GateDecision<A> {
    pub fn blocking_ids(&self) -> Vec<DbId> {
        self.blocking.iter().map(Gated::gate_id).collect()
    }
}

/// Whether an assignment gates the target.
///
/// Only active, pre-timed assignments gate. Course-level gates apply to the
/// course and to every module in it; module-level gates apply to their own
/// module only.
pub fn gates_target<A: Gated>(assignment: &A, target: &AccessTarget) -> bool {
    if !assignment.gate_active() || assignment.gate_timing() != Timing::Pre {
        return false;
    }
    let scope = assignment.gate_scope();
    if scope.course_id != target.course_id {
        return false;
    }
    match scope.scope_type {
        ScopeType::Course => true,
        ScopeType::Module => target.module_id.is_some() && scope.module_id == target.module_id,
    }
}

/// Evaluate the gate for `target`.
///
/// `completed` holds ids of assignments the learner has a response with
/// `is_complete = true` for. The blocking set keeps the input order.
pub fn evaluate_gate<A: Gated + Clone>(
    target: &AccessTarget,
    assignments: &[A],
    completed: &HashSet<DbId>,
) -> GateDecision<A> {
    let blocking: Vec<A> = assignments
        .iter()
        .filter(|a| gates_target(*a, target))
        .filter(|a| !completed.contains(&a.gate_id()))
        .cloned()
        .collect();

    let allowed = blocking.is_empty();
    let reason = (!allowed).then(|| {
        format!(
            "{} required questionnaire(s) must be completed first",
            blocking.len()
        )
    });

    GateDecision {
        allowed,
        reason,
        blocking,
    }
}
