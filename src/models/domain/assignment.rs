use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A quiz offered to a group over a bounded date window, with a daily
/// activation interval and a fixed per-attempt duration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Assignment {
    pub id: String,
    pub quiz_id: String,
    pub group_id: String,
    pub name: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub daily_start: NaiveTime,
    pub daily_end: NaiveTime,
    pub duration_seconds: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Assignment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quiz_id: &str,
        group_id: &str,
        name: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        daily_start: NaiveTime,
        daily_end: NaiveTime,
        duration_seconds: i64,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Assignment {
            id: Uuid::new_v4().to_string(),
            quiz_id: quiz_id.to_string(),
            group_id: group_id.to_string(),
            name: name.to_string(),
            window_start,
            window_end,
            daily_start,
            daily_end,
            duration_seconds,
            created_by: created_by.to_string(),
            created_at: now,
            deleted_at: None,
        }
    }

    /// Whether `now` falls inside the assignment window: the date must be
    /// within [window_start, window_end] and the time of day within
    /// [daily_start, daily_end).
    pub fn accepts(&self, now: DateTime<Utc>) -> bool {
        let date = now.date_naive();
        if date < self.window_start.date_naive() || date > self.window_end.date_naive() {
            return false;
        }
        let time = now.time();
        time >= self.daily_start && time < self.daily_end
    }

    /// The last instant at which the window accepts start/resume: the daily
    /// deactivation time on the final window day.
    pub fn window_close_instant(&self) -> DateTime<Utc> {
        self.window_end
            .date_naive()
            .and_time(self.daily_end)
            .and_utc()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
