use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Wall-clock source. Window checks and time-budget reconciliation go through
/// this trait so tests can pin the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for deterministic tests.
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.lock().expect("clock mutex poisoned") = instant;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut current = self.current.lock().expect("clock mutex poisoned");
        *current += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().expect("clock mutex poisoned")
    }
}
