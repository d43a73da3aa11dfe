pub mod answer_repository;
pub mod assignment_repository;
pub mod attempt_repository;

pub use answer_repository::{AnswerRepository, MongoAnswerRepository};
pub use assignment_repository::{AssignmentRepository, MongoAssignmentRepository};
pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};

#[cfg(test)]
pub use answer_repository::MockAnswerRepository;
#[cfg(test)]
pub use assignment_repository::MockAssignmentRepository;
#[cfg(test)]
pub use attempt_repository::MockAttemptRepository;
