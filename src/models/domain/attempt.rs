use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::Assignment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

/// One user's run at one assignment. Unique per (assignment_id, user_id).
///
/// `remaining_seconds` is the budget as of `anchored_at`; while the attempt
/// is in progress the live budget is that value minus the wall-clock elapsed
/// since the anchor. `version` guards every write (compare-and-swap).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub assignment_id: String,
    pub user_id: String,
    pub status: AttemptStatus,
    pub remaining_seconds: i64,
    pub anchored_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Attempt {
    /// A fresh attempt claimed on first start.
    pub fn started(assignment: &Assignment, user_id: &str, now: DateTime<Utc>) -> Self {
        Attempt {
            id: Uuid::new_v4().to_string(),
            assignment_id: assignment.id.clone(),
            user_id: user_id.to_string(),
            status: AttemptStatus::InProgress,
            remaining_seconds: assignment.duration_seconds,
            anchored_at: now,
            score: None,
            started_at: Some(now),
            completed_at: None,
            version: 0,
        }
    }

    /// An attempt pre-seeded by an assigner before the student ever opens it.
    pub fn seeded(assignment: &Assignment, user_id: &str, now: DateTime<Utc>) -> Self {
        Attempt {
            id: Uuid::new_v4().to_string(),
            assignment_id: assignment.id.clone(),
            user_id: user_id.to_string(),
            status: AttemptStatus::NotStarted,
            remaining_seconds: assignment.duration_seconds,
            anchored_at: now,
            score: None,
            started_at: None,
            completed_at: None,
            version: 0,
        }
    }

    /// Upper bound on the time budget a client can truthfully report at
    /// `now`. While in progress the clock runs against the anchor; in every
    /// other state the persisted value is the bound.
    pub fn remaining_bound(&self, now: DateTime<Utc>) -> i64 {
        match self.status {
            AttemptStatus::InProgress => {
                let elapsed = (now - self.anchored_at).num_seconds().max(0);
                (self.remaining_seconds - elapsed).max(0)
            }
            _ => self.remaining_seconds.max(0),
        }
    }

    /// Reconcile a client-reported remaining time against the server bound.
    /// The report is never trusted above what is mathematically possible.
    pub fn clamp_reported(&self, reported: i64, now: DateTime<Utc>) -> i64 {
        reported.clamp(0, self.remaining_bound(now))
    }

    pub fn is_terminal(&self) -> bool {
        self.status == AttemptStatus::Completed
    }
}
