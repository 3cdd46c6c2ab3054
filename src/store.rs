// Read-side contract between the history core and whatever holds the event rows.
// HistoryRepo (SQLite) is the production implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::HistoryError;
use crate::models::{HostMetric, PageParams};
use crate::timespan::{TimeBucket, TimeSpan};

/// Event tables that can be counted per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    ApiRequests,
    BackgroundJobs,
    BackgroundJobErrors,
}

impl EventSource {
    pub fn table(self) -> &'static str {
        match self {
            EventSource::ApiRequests => "api_requests",
            EventSource::BackgroundJobs => "background_jobs",
            EventSource::BackgroundJobErrors => "background_job_errors",
        }
    }

    /// Nullable error-indicator column, if the table has one.
    pub fn error_column(self) -> Option<&'static str> {
        match self {
            EventSource::ApiRequests | EventSource::BackgroundJobErrors => Some("error_class"),
            EventSource::BackgroundJobs => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFilter {
    Any,
    /// Error indicator IS NULL.
    Success,
    /// Error indicator IS NOT NULL.
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountGrouping {
    /// One count per bucket.
    Total,
    /// One count per (bucket, response-status class).
    StatusClass,
}

/// Project + span + bucket: the common shape of every bucketed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketQuery {
    pub project_id: i64,
    pub span: TimeSpan,
    pub bucket: TimeBucket,
}

impl BucketQuery {
    /// First bucket start. Rows are assigned to
    /// `origin + floor((time - origin) / interval) * interval`.
    pub fn origin(&self) -> DateTime<Utc> {
        self.bucket.align_down(self.span.start())
    }

    /// Length of the analytic bucket sequence.
    pub fn bucket_count(&self) -> i64 {
        self.bucket.count(self.span.start(), self.span.end())
    }

    /// Analytic bucket sequence for the span.
    pub fn enumerate(&self) -> Vec<DateTime<Utc>> {
        self.bucket.enumerate(self.span.start(), self.span.end())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountQuery {
    pub source: EventSource,
    pub range: BucketQuery,
    pub grouping: CountGrouping,
    pub filter: ErrorFilter,
}

/// One grouped-count result row. `group` is `None` for `CountGrouping::Total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCount {
    pub bucket: DateTime<Utc>,
    pub group: Option<String>,
    pub count: i64,
}

/// Continuous percentiles of request duration (seconds) for one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketPercentiles {
    pub bucket: DateTime<Utc>,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// True when the store itself emits a row for every bucket in range
    /// (whenever the range holds at least one row).
    fn native_gapfill(&self) -> bool {
        false
    }

    async fn count_by_bucket(&self, query: &CountQuery) -> Result<Vec<BucketCount>, HistoryError>;

    /// p50/p95/p99 of `api_requests.dt` per bucket; buckets without durations are omitted.
    async fn percentiles_by_bucket(
        &self,
        query: &BucketQuery,
    ) -> Result<Vec<BucketPercentiles>, HistoryError>;

    /// One page of host metrics in ascending time order plus the total row count.
    /// With `stride = Some(n)` only rows whose 0-based time ordinal is a multiple
    /// of `n` take part, in both the page and the count.
    async fn host_metrics_page(
        &self,
        project_id: i64,
        span: &TimeSpan,
        page: PageParams,
        stride: Option<u32>,
    ) -> Result<(Vec<HostMetric>, u64), HistoryError>;
}
