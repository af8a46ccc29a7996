//! Date handling for forecast windows and payload timestamps.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Hour of day (UTC) at which forecast days are anchored.
pub const ANCHOR_HOUR: u32 = 12;

/// Parse a payload timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (assumed UTC) or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_forecast_time(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format as `YYYY-MM-DD`, the form used in forecast endpoint paths.
pub fn format_iso_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Format for labels, e.g. `June 05, 2025`.
pub fn format_human_date(dt: &DateTime<Utc>) -> String {
    dt.format("%B %d, %Y").to_string()
}

/// True when both instants fall on the same UTC calendar day.
pub fn same_day(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

/// The scrubbable range of forecast days.
///
/// Starts on a given day at 12:00 UTC and ends on the first day of the month
/// `months` later. Offsets are whole days from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_days: u32,
}

impl ForecastWindow {
    /// Build the window starting on `today`.
    pub fn starting(today: NaiveDate, months: u32) -> Result<Self, TimeParseError> {
        let anchor = NaiveTime::from_hms_opt(ANCHOR_HOUR, 0, 0)
            .ok_or_else(|| TimeParseError::OutOfRange("anchor hour".to_string()))?;

        let end_day = today
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(months)))
            .ok_or_else(|| TimeParseError::OutOfRange(format!("{} + {} months", today, months)))?;

        let start = Utc.from_utc_datetime(&today.and_time(anchor));
        let end = Utc.from_utc_datetime(&end_day.and_time(anchor));
        let total_days = (end - start).num_days().max(0) as u32;

        Ok(Self {
            start,
            end,
            total_days,
        })
    }

    /// Build the window starting today (UTC).
    pub fn from_today(months: u32) -> Result<Self, TimeParseError> {
        Self::starting(Utc::now().date_naive(), months)
    }

    /// Clamp an offset into `[0, total_days]`.
    pub fn clamp_offset(&self, offset: i64) -> u32 {
        offset.clamp(0, self.total_days as i64) as u32
    }

    /// Date at a day offset from the start (offset is clamped).
    pub fn date_at(&self, offset: i64) -> DateTime<Utc> {
        self.start + Duration::days(self.clamp_offset(offset) as i64)
    }

    /// Day offset of `date`, if it falls inside the window.
    pub fn offset_of(&self, date: &DateTime<Utc>) -> Option<u32> {
        let days = (date.date_naive() - self.start.date_naive()).num_days();
        if days < 0 || days > self.total_days as i64 {
            return None;
        }
        Some(days as u32)
    }

    /// Whether `offset` is at or past the final day.
    pub fn is_last(&self, offset: u32) -> bool {
        offset >= self.total_days
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Date out of range: {0}")]
    OutOfRange(String),
}
