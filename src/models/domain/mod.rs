pub mod answer_entry;
pub mod assignment;
pub mod attempt;

pub use answer_entry::AnswerEntry;
pub use assignment::Assignment;
pub use attempt::{Attempt, AttemptStatus};
