use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{AnswerEntry, Attempt, AttemptStatus};

/// Snapshot of an attempt as the client should see it. `remaining_seconds`
/// is the live server-side bound at read time, not the last persisted value.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptView {
    pub attempt_id: String,
    pub assignment_id: String,
    pub status: AttemptStatus,
    pub remaining_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AttemptView {
    pub fn of(attempt: &Attempt, now: DateTime<Utc>) -> Self {
        AttemptView {
            attempt_id: attempt.id.clone(),
            assignment_id: attempt.assignment_id.clone(),
            status: attempt.status,
            remaining_seconds: attempt.remaining_bound(now),
            score: attempt.score,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub selected_option: String,
    pub is_correct: bool,
    /// True when this submission was an identical retry of an already
    /// recorded answer and no new entry was written.
    pub already_recorded: bool,
}

impl AnswerOutcome {
    pub fn recorded(entry: &AnswerEntry) -> Self {
        Self::from_entry(entry, false)
    }

    pub fn retried(entry: &AnswerEntry) -> Self {
        Self::from_entry(entry, true)
    }

    fn from_entry(entry: &AnswerEntry, already_recorded: bool) -> Self {
        AnswerOutcome {
            question_id: entry.question_id.clone(),
            selected_option: entry.selected_option.clone(),
            is_correct: entry.is_correct,
            already_recorded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub attempt_id: String,
    pub score: f64,
    pub correct_count: usize,
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
