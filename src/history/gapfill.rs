// Gap-fill: choose the bucket sequence and expand partial per-group results into a
// dense series where every bucket carries every configured group.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::models::{Series, SeriesPoint};
use crate::store::BucketQuery;

/// group key -> bucket start -> value
pub type GroupedValues<V> = HashMap<String, HashMap<DateTime<Utc>, V>>;

/// Observed buckets when the store gap-filled them itself and returned anything;
/// otherwise the analytic enumeration over the query span.
pub fn bucket_sequence(
    observed: impl IntoIterator<Item = DateTime<Utc>>,
    store_gapfilled: bool,
    query: &BucketQuery,
) -> Vec<DateTime<Utc>> {
    if store_gapfilled {
        let distinct: BTreeSet<DateTime<Utc>> = observed.into_iter().collect();
        if !distinct.is_empty() {
            return distinct.into_iter().collect();
        }
    }
    tracing::debug!(bucket = %query.bucket, "enumerating bucket sequence");
    query.enumerate()
}

/// One point per bucket (ascending), every group in `groups` order; missing values are `V::default()`.
pub fn merge<V: Copy + Default>(
    buckets: &[DateTime<Utc>],
    groups: &[&'static str],
    results: &GroupedValues<V>,
) -> Series<V> {
    let mut ordered = buckets.to_vec();
    ordered.sort();
    ordered.dedup();
    ordered
        .into_iter()
        .map(|time| SeriesPoint {
            time,
            values: groups
                .iter()
                .map(|&group| {
                    let value = results
                        .get(group)
                        .and_then(|by_bucket| by_bucket.get(&time))
                        .copied()
                        .unwrap_or_default();
                    (group, value)
                })
                .collect(),
        })
        .collect()
}
