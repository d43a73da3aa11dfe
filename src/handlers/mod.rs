pub mod assignment_handler;
pub mod attempt_handler;

pub use assignment_handler::{
    create_assignment, delete_assignment, get_assignment, get_assignment_by_name,
    list_assignments,
};
pub use attempt_handler::{
    delete_attempt, finish_attempt, get_score, health_check, health_check_ready, leave_attempt,
    list_answers, list_attempts, seed_attempt, start_or_resume, submit_answer,
};
