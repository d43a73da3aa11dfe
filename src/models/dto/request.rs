use chrono::{DateTime, NaiveTime, Utc};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1))]
    pub quiz_id: String,

    #[validate(length(min = 1))]
    pub group_id: String,

    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub daily_start: NaiveTime,
    pub daily_end: NaiveTime,

    #[validate(range(min = 1))]
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,

    #[validate(length(min = 1))]
    pub selected_option: String,
}

/// Client-side countdown snapshot sent on finish/leave. The value is an
/// untrusted input; the engine clamps it against the server bound.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportTimeRequest {
    #[validate(range(min = 0))]
    pub remaining_seconds: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeedAttemptRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
}
