// Bucketed history planner: decides which grouped queries to run against the
// store and hands their partial results to the gap-fill merger.
//
// Binary (success/error) histories always run two independent counts, one per
// predicate, and merge them here rather than asking the store for a conditional
// group.

pub mod gapfill;
pub mod percentile;
pub mod status;

use std::collections::HashMap;

use crate::error::HistoryError;
use crate::models::Series;
use crate::store::{
    BucketCount, BucketQuery, CountGrouping, CountQuery, ErrorFilter, EventSource, EventStore,
};
use gapfill::GroupedValues;

pub use percentile::{PERCENTILE_GROUPS, latency_history};
pub use status::STATUS_GROUPS;

pub const SUCCESS: &str = "success";
pub const ERROR: &str = "error";
pub const BINARY_GROUPS: [&str; 2] = [SUCCESS, ERROR];

/// `group_by` for request history. Unknown values group by response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    ResponseStatus,
    Error,
}

impl GroupBy {
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("error") => GroupBy::Error,
            _ => GroupBy::ResponseStatus,
        }
    }
}

/// API request counts per bucket, by status class or by success/error.
pub async fn request_history<S: EventStore + ?Sized>(
    store: &S,
    query: &BucketQuery,
    group_by: GroupBy,
) -> Result<Series<i64>, HistoryError> {
    match group_by {
        GroupBy::ResponseStatus => status_history(store, query).await,
        GroupBy::Error => {
            binary_history(
                store,
                query,
                (EventSource::ApiRequests, ErrorFilter::Success),
                (EventSource::ApiRequests, ErrorFilter::Failure),
            )
            .await
        }
    }
}

/// Background job completions (success) vs. recorded job errors per bucket.
pub async fn job_history<S: EventStore + ?Sized>(
    store: &S,
    query: &BucketQuery,
) -> Result<Series<i64>, HistoryError> {
    binary_history(
        store,
        query,
        (EventSource::BackgroundJobs, ErrorFilter::Any),
        (EventSource::BackgroundJobErrors, ErrorFilter::Any),
    )
    .await
}

async fn status_history<S: EventStore + ?Sized>(
    store: &S,
    query: &BucketQuery,
) -> Result<Series<i64>, HistoryError> {
    let rows = store
        .count_by_bucket(&CountQuery {
            source: EventSource::ApiRequests,
            range: *query,
            grouping: CountGrouping::StatusClass,
            filter: ErrorFilter::Any,
        })
        .await?;
    tracing::debug!(bucket = %query.bucket, rows = rows.len(), "status counts fetched");

    let buckets =
        gapfill::bucket_sequence(rows.iter().map(|r| r.bucket), store.native_gapfill(), query);
    let mut counts: GroupedValues<i64> = HashMap::new();
    for row in &rows {
        let group = row.group.as_deref().unwrap_or(status::UNKNOWN_STATUS);
        add_count(&mut counts, group, row);
    }
    Ok(gapfill::merge(&buckets, &STATUS_GROUPS, &counts))
}

async fn binary_history<S: EventStore + ?Sized>(
    store: &S,
    query: &BucketQuery,
    success: (EventSource, ErrorFilter),
    error: (EventSource, ErrorFilter),
) -> Result<Series<i64>, HistoryError> {
    let total = |(source, filter): (EventSource, ErrorFilter)| CountQuery {
        source,
        range: *query,
        grouping: CountGrouping::Total,
        filter,
    };
    let success_rows = store.count_by_bucket(&total(success)).await?;
    let error_rows = store.count_by_bucket(&total(error)).await?;
    tracing::debug!(
        bucket = %query.bucket,
        success_rows = success_rows.len(),
        error_rows = error_rows.len(),
        "binary counts fetched"
    );

    let observed = success_rows.iter().chain(&error_rows).map(|r| r.bucket);
    let buckets = gapfill::bucket_sequence(observed, store.native_gapfill(), query);

    let mut counts: GroupedValues<i64> = HashMap::new();
    for row in &success_rows {
        add_count(&mut counts, SUCCESS, row);
    }
    for row in &error_rows {
        add_count(&mut counts, ERROR, row);
    }
    Ok(gapfill::merge(&buckets, &BINARY_GROUPS, &counts))
}

fn add_count(counts: &mut GroupedValues<i64>, group: &str, row: &BucketCount) {
    *counts
        .entry(group.to_string())
        .or_default()
        .entry(row.bucket)
        .or_default() += row.count;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_by_defaults_to_response_status() {
        assert_eq!(GroupBy::parse(Some("error")), GroupBy::Error);
        assert_eq!(GroupBy::parse(Some("response_status")), GroupBy::ResponseStatus);
        assert_eq!(GroupBy::parse(Some("verb")), GroupBy::ResponseStatus);
        assert_eq!(GroupBy::parse(None), GroupBy::ResponseStatus);
    }
}
