pub mod assignment_service;
pub mod attempt_locks;
pub mod attempt_service;
pub mod scoring_service;

pub use assignment_service::AssignmentService;
pub use attempt_locks::AttemptLocks;
pub use attempt_service::AttemptService;
pub use scoring_service::ScoringService;
