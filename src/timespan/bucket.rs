// Bucket specifiers ("5m", "1h") and bucket-boundary arithmetic.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::error::HistoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl BucketUnit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(BucketUnit::Second),
            'm' => Some(BucketUnit::Minute),
            'h' => Some(BucketUnit::Hour),
            'd' => Some(BucketUnit::Day),
            _ => None,
        }
    }

    /// Length of one unit in seconds.
    pub fn seconds(self) -> i64 {
        match self {
            BucketUnit::Second => 1,
            BucketUnit::Minute => 60,
            BucketUnit::Hour => 3_600,
            BucketUnit::Day => 86_400,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BucketUnit::Second => "second",
            BucketUnit::Minute => "minute",
            BucketUnit::Hour => "hour",
            BucketUnit::Day => "day",
        }
    }
}

/// Fixed-width aggregation bucket: `size` units wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucket {
    size: u32,
    unit: BucketUnit,
}

impl TimeBucket {
    /// Parse `<positive integer><s|m|h|d>`, e.g. `"30s"`, `"5m"`, `"1d"`.
    pub fn parse(spec: &str) -> Result<Self, HistoryError> {
        let invalid = || HistoryError::InvalidBucket(spec.to_string());

        let mut chars = spec.chars();
        let unit = chars
            .next_back()
            .and_then(BucketUnit::from_char)
            .ok_or_else(invalid)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let size: u32 = digits.parse().map_err(|_| invalid())?;
        if size == 0 {
            return Err(invalid());
        }
        Ok(Self { size, unit })
    }

    pub fn interval_secs(&self) -> i64 {
        self.size as i64 * self.unit.seconds()
    }

    pub fn interval(&self) -> Duration {
        Duration::seconds(self.interval_secs())
    }

    /// Floor `t` to the start of its unit (UTC). Second buckets are returned unchanged.
    pub fn align_down(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        if self.unit == BucketUnit::Second {
            return t;
        }
        let unit_secs = self.unit.seconds();
        let over = t.timestamp().rem_euclid(unit_secs);
        t - Duration::seconds(over) - Duration::nanoseconds(t.timestamp_subsec_nanos() as i64)
    }

    /// Number of buckets `enumerate` yields for the range, without allocating them.
    pub fn count(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        let origin = self.align_down(start);
        let interval_ms = self.interval_secs() * 1000;
        let span_ms = (end - origin).num_milliseconds().max(0);
        span_ms.div_euclid(interval_ms) + 1
    }

    /// Every bucket start from `align_down(start)` up to the last one `<= end`.
    /// Always yields at least one instant.
    pub fn enumerate(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let origin = self.align_down(start);
        let count = self.count(start, end);
        let interval_secs = self.interval_secs();
        (0..count)
            .map(|i| origin + Duration::seconds(interval_secs * i))
            .collect()
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.size, self.unit.name())
    }
}
