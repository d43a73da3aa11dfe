use chrono::{NaiveTime, TimeZone, Utc};

use crate::models::domain::{Assignment, Attempt};
