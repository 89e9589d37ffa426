use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

/// Half-open `[start, end)` fetch window shared by the price and weather fetchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ForecastWindow {
    /// Starts at the UTC midnight before `now`'s UTC date and spans `horizon_days + 1` days.
    pub fn for_horizon(now: DateTime<Utc>, horizon_days: u32) -> Self {
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let start = today - Duration::days(1);
        let end = start + Duration::days(i64::from(horizon_days) + 1);
        Self { start, end }
    }

    pub fn contains<Tz: chrono::TimeZone>(&self, ts: &DateTime<Tz>) -> bool {
        let ts = ts.with_timezone(&Utc);
        ts >= self.start && ts < self.end
    }

    pub fn hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }
}
