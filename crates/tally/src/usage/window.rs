use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the trailing usage window: 30 days.
pub const USAGE_WINDOW_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Time range `[start, end]` in which a job must have ended to count towards usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UsageWindow {
    pub fn ending_at(end: DateTime<Utc>, length: Duration) -> Self {
        let length = chrono::Duration::from_std(length).unwrap_or(chrono::Duration::MAX);
        let start = end.checked_sub_signed(length).unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    /// Window of the given length that ends now.
    pub fn trailing(length: Duration) -> Self {
        Self::ending_at(Utc::now(), length)
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        self.start <= *time && *time <= self.end
    }

    pub fn length(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }
}

impl Default for UsageWindow {
    fn default() -> Self {
        Self::trailing(Duration::from_secs(USAGE_WINDOW_SECONDS))
    }
}
