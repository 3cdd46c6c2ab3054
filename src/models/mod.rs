// Domain models: stored event rows, history series and pagination envelopes.

mod event;
pub(crate) mod pagination;
mod series;

pub use event::{ApiRequest, BackgroundJob, BackgroundJobError, HostMetric, Project};
pub use pagination::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MetricsPage, PageMeta, PageParams, Pagination};
pub use series::{HistoryResponse, Series, SeriesPoint, SpanMeta};

/// Serde adapter: `DateTime<Utc>` as fractional unix seconds (millisecond precision).
pub(crate) mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(t.timestamp_millis() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(d)?;
        DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {secs}")))
    }
}
