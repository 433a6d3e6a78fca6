//! Transactional engine operations.
//!
//! Each operation opens one transaction, performs every check before its
//! first write, and commits all effects together: a response and the flags
//! it propagates, a module completion and the aggregates it recomputes, an
//! idempotency key and the result stored under it. Handlers call into here
//! and publish events once the transaction has committed.

pub mod binder;
pub mod completion;
pub mod gate;
pub mod grader;
pub mod idempotency;
pub mod propagator;
pub mod templates;
