//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that take part in multi-row transactions accept any Postgres
//! executor, so callers pass either `&PgPool` or `&mut *tx`.

pub mod assignment_repo;
pub mod audit_repo;
pub mod course_repo;
pub mod enrollment_repo;
pub mod idempotency_repo;
pub mod module_repo;
pub mod progress_repo;
pub mod questionnaire_repo;
pub mod response_repo;

pub use assignment_repo::AssignmentRepo;
pub use audit_repo::AuditLogRepo;
pub use course_repo::CourseRepo;
pub use enrollment_repo::EnrollmentRepo;
pub use idempotency_repo::IdempotencyRepo;
pub use module_repo::ModuleRepo;
pub use progress_repo::ProgressRepo;
pub use questionnaire_repo::QuestionnaireRepo;
pub use response_repo::ResponseRepo;
