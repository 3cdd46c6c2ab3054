// Resolves the caller's span parameters into a concrete UTC [start, end] pair.
// Unknown span types resolve to prev_day and are never an error.

pub mod bucket;

pub use bucket::{BucketUnit, TimeBucket};

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};

use crate::error::HistoryError;
use crate::models::SpanMeta;

/// Named span presets plus `custom` (explicit start/end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanType {
    PrevHour,
    Prev8Hours,
    PrevDay,
    Prev2Days,
    PrevWeek,
    PrevMonth,
    Custom,
}

impl SpanType {
    /// Missing or unrecognised values resolve to `PrevDay`.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("prev_hour") => SpanType::PrevHour,
            Some("prev_8_hours") => SpanType::Prev8Hours,
            Some("prev_day") => SpanType::PrevDay,
            Some("prev_2_days") => SpanType::Prev2Days,
            Some("prev_week") => SpanType::PrevWeek,
            Some("prev_month") => SpanType::PrevMonth,
            Some("custom") => SpanType::Custom,
            _ => SpanType::PrevDay,
        }
    }

    fn preset_start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = match self {
            SpanType::PrevHour => now - Duration::hours(1),
            SpanType::Prev8Hours => now - Duration::hours(8),
            SpanType::PrevDay => now - Duration::days(1),
            SpanType::Prev2Days => now - Duration::days(2),
            SpanType::PrevWeek => now - Duration::weeks(1),
            SpanType::PrevMonth => now
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now - Duration::days(30)),
            SpanType::Custom => return None,
        };
        Some(start)
    }
}

/// Resolved query window. Invariant: `start <= end`, both whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSpan {
    /// Rounds both ends to whole seconds and orders them.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let (start, end) = (round_to_second(start), round_to_second(end));
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn resolve(
        span_type: Option<&str>,
        start_param: Option<&str>,
        end_param: Option<&str>,
    ) -> Result<Self, HistoryError> {
        Self::resolve_at(span_type, start_param, end_param, Utc::now())
    }

    /// Same as [`TimeSpan::resolve`] with an explicit "now".
    pub fn resolve_at(
        span_type: Option<&str>,
        start_param: Option<&str>,
        end_param: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, HistoryError> {
        let span_type = SpanType::parse(span_type);
        if let Some(start) = span_type.preset_start(now) {
            return Ok(Self::new(start, now));
        }

        let start = match non_blank(start_param) {
            Some(s) => parse_date_param(s)?,
            None => now - Duration::hours(1),
        };
        let end = match non_blank(end_param) {
            Some(s) => parse_date_param(s)?,
            None => now,
        };
        Ok(Self::new(start, end))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn meta(&self) -> SpanMeta {
        SpanMeta {
            start_time: self.start.timestamp() as f64,
            end_time: self.end.timestamp() as f64,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Nearest whole second, half-second rounds up.
fn round_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = t.timestamp_subsec_nanos() as i64;
    let truncated = t - Duration::nanoseconds(nanos);
    if nanos >= 500_000_000 {
        truncated + Duration::seconds(1)
    } else {
        truncated
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Unix seconds (integer or fractional) or an ISO-like date; naive values are UTC.
pub fn parse_date_param(s: &str) -> Result<DateTime<Utc>, HistoryError> {
    let s = s.trim();
    let invalid = || HistoryError::InvalidDate(s.to_string());

    if let Ok(secs) = s.parse::<f64>() {
        if !secs.is_finite() {
            return Err(invalid());
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        return DateTime::from_timestamp(whole as i64, nanos).ok_or_else(invalid);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(invalid);
    }
    Err(invalid())
}
