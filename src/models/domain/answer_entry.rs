use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The recorded response to a single question within a single attempt.
/// Unique per (attempt_id, question_id). The correct option key is frozen at
/// write time; later catalog corrections do not rewrite history.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnswerEntry {
    pub id: String,
    pub attempt_id: String,
    pub student_id: String,
    pub quiz_id: String,
    pub question_id: String,
    pub correct_option: String,
    pub selected_option: String,
    pub is_correct: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AnswerEntry {
    pub fn record(
        attempt_id: &str,
        student_id: &str,
        quiz_id: &str,
        question_id: &str,
        correct_option: &str,
        selected_option: &str,
        now: DateTime<Utc>,
    ) -> Self {
        AnswerEntry {
            id: Uuid::new_v4().to_string(),
            attempt_id: attempt_id.to_string(),
            student_id: student_id.to_string(),
            quiz_id: quiz_id.to_string(),
            question_id: question_id.to_string(),
            correct_option: correct_option.to_string(),
            selected_option: selected_option.to_string(),
            is_correct: selected_option == correct_option,
            recorded_at: now,
        }
    }
}
