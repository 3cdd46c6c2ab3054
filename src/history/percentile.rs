// Latency percentiles (p50/p95/p99) per bucket.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::gapfill::{self, GroupedValues};
use crate::error::HistoryError;
use crate::models::Series;
use crate::store::{BucketPercentiles, BucketQuery, EventStore};

pub const PERCENTILE_GROUPS: [&str; 3] = ["p50", "p95", "p99"];

/// Continuous (interpolating) percentile of ascending `sorted`, `fraction` in [0, 1].
pub fn percentile_cont(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = fraction.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * weight)
}

/// Reduce `(bucket, duration)` samples to one percentile row per bucket, ascending.
pub fn reduce_by_bucket(
    mut samples: Vec<(DateTime<Utc>, f64)>,
) -> Vec<BucketPercentiles> {
    samples.retain(|(_, v)| v.is_finite());
    samples.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut out = Vec::new();
    for chunk in samples.chunk_by(|a, b| a.0 == b.0) {
        let values: Vec<f64> = chunk.iter().map(|(_, v)| *v).collect();
        let pct = |f| percentile_cont(&values, f).unwrap_or_default();
        out.push(BucketPercentiles {
            bucket: chunk[0].0,
            p50: pct(0.50),
            p95: pct(0.95),
            p99: pct(0.99),
        });
    }
    out
}

/// Seconds to milliseconds; applied once, to the merged series.
pub fn to_milliseconds(series: Series<f64>) -> Series<f64> {
    series
        .into_iter()
        .map(|mut point| {
            for (_, value) in point.values.iter_mut() {
                *value *= 1000.0;
            }
            point
        })
        .collect()
}

/// Gap-filled p50/p95/p99 request latency in milliseconds.
pub async fn latency_history<S: EventStore + ?Sized>(
    store: &S,
    query: &BucketQuery,
) -> Result<Series<f64>, HistoryError> {
    let rows = store.percentiles_by_bucket(query).await?;
    tracing::debug!(bucket = %query.bucket, rows = rows.len(), "latency percentiles fetched");

    let buckets =
        gapfill::bucket_sequence(rows.iter().map(|r| r.bucket), store.native_gapfill(), query);
    let mut values: GroupedValues<f64> = HashMap::new();
    for row in &rows {
        for (key, value) in PERCENTILE_GROUPS.iter().zip([row.p50, row.p95, row.p99]) {
            values
                .entry((*key).to_string())
                .or_default()
                .insert(row.bucket, value);
        }
    }
    Ok(to_milliseconds(gapfill::merge(
        &buckets,
        &PERCENTILE_GROUPS,
        &values,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesPoint;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn percentile_cont_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(close(percentile_cont(&v, 0.5).unwrap(), 2.5));
        assert!(close(percentile_cont(&v, 0.0).unwrap(), 1.0));
        assert!(close(percentile_cont(&v, 1.0).unwrap(), 4.0));
        // rank = 0.95 * 3 = 2.85
        assert!(close(percentile_cont(&v, 0.95).unwrap(), 3.85));
    }

    #[test]
    fn percentile_cont_single_and_empty() {
        assert_eq!(percentile_cont(&[0.25], 0.99), Some(0.25));
        assert_eq!(percentile_cont(&[], 0.5), None);
    }

    #[test]
    fn reduce_groups_by_bucket_regardless_of_input_order() {
        let samples = vec![(ts(60), 0.3), (ts(0), 0.2), (ts(60), 0.1), (ts(0), 0.4)];
        let rows = reduce_by_bucket(samples);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bucket, ts(0));
        assert!(close(rows[0].p50, 0.3));
        assert_eq!(rows[1].bucket, ts(60));
        assert!(close(rows[1].p50, 0.2));
    }

    #[test]
    fn milliseconds_conversion_keeps_zero_fill() {
        let series = vec![
            SeriesPoint { time: ts(0), values: vec![("p50", 0.0), ("p95", 0.0), ("p99", 0.0)] },
            SeriesPoint { time: ts(60), values: vec![("p50", 0.012), ("p95", 0.5), ("p99", 1.25)] },
        ];
        let out = to_milliseconds(series);
        assert_eq!(out[0].get("p99"), Some(&0.0));
        assert!(close(*out[1].get("p50").unwrap(), 12.0));
        assert!(close(*out[1].get("p99").unwrap(), 1250.0));
    }
}
