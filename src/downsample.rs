// Uniform downsampling of host metrics by time ordinal: keep every n-th row
// (0-based position mod n == 0), where n = ceil(min_spacing / native_spacing).
// The store executes the selection with row_number(); `select_stride` is the
// in-process equivalent and both must agree row for row.

use crate::error::HistoryError;
use crate::models::pagination::positive_int;
use crate::models::{HostMetric, PageParams};
use crate::store::EventStore;
use crate::timespan::TimeSpan;

/// Nominal host-metric sampling interval.
pub const NATIVE_SAMPLE_SPACING_SECS: u32 = 30;

/// Requested minimum spacing in seconds, read from the leading integer
/// (`"300.0"` is 300). Absent, non-numeric or non-positive values are `None`.
pub fn parse_min_spacing(raw: Option<&str>) -> Option<u32> {
    positive_int(raw)
}

/// Stride for `min_spacing_secs`, or `None` when no downsampling is needed.
pub fn stride(min_spacing_secs: Option<u32>, native_spacing_secs: u32) -> Option<u32> {
    let native = native_spacing_secs.max(1);
    match min_spacing_secs {
        Some(min) if min > native => Some(min.div_ceil(native)),
        _ => None,
    }
}

/// Rows whose 0-based position is a multiple of `n`.
pub fn select_stride<T>(rows: impl IntoIterator<Item = T>, n: u32) -> Vec<T> {
    let n = n.max(1) as usize;
    rows.into_iter()
        .enumerate()
        .filter(|(i, _)| i % n == 0)
        .map(|(_, row)| row)
        .collect()
}

/// How many of `total` rows the stride keeps: ceil(total / n).
pub fn stride_count(total: u64, n: u32) -> u64 {
    total.div_ceil(n.max(1) as u64)
}

/// In-process sampling over rows already ordered by time: the selected page and
/// the exact number of selected rows across the whole input.
pub fn sample<T: Clone>(
    ordered: &[T],
    min_spacing_secs: Option<u32>,
    native_spacing_secs: u32,
    page: PageParams,
) -> (Vec<T>, u64) {
    let selected: Vec<&T> = match stride(min_spacing_secs, native_spacing_secs) {
        Some(n) => select_stride(ordered, n),
        None => ordered.iter().collect(),
    };
    let total = selected.len() as u64;
    let rows = selected
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.per_page as usize)
        .cloned()
        .collect();
    (rows, total)
}

/// Host metrics for `span`, downsampled when the requested spacing is coarser
/// than the native one, paginated after selection.
pub async fn list_host_metrics<S: EventStore + ?Sized>(
    store: &S,
    project_id: i64,
    span: &TimeSpan,
    min_spacing_secs: Option<u32>,
    native_spacing_secs: u32,
    page: PageParams,
) -> Result<(Vec<HostMetric>, u64), HistoryError> {
    let n = stride(min_spacing_secs, native_spacing_secs);
    tracing::debug!(?n, page = page.page, per_page = page.per_page, "listing host metrics");
    store.host_metrics_page(project_id, span, page, n).await
}
