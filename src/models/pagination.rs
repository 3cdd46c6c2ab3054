// Page/per-page coercion and the pagination descriptor returned with list pages.

use serde::Serialize;

use super::{HostMetric, SpanMeta};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;

/// 1-based page request. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageParams {
    /// Coerce raw query values; non-numeric or non-positive values take the defaults.
    /// `per_page` is capped at `max_per_page`.
    pub fn from_params(
        page: Option<&str>,
        per_page: Option<&str>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        Self {
            page: positive_or(page, DEFAULT_PAGE),
            per_page: positive_or(per_page, default_per_page).min(max_per_page.max(1)),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }
}

fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    positive_int(raw).unwrap_or(default)
}

/// Leading integer of `raw` (`" 300s"` and `"300.0"` read as 300), kept only
/// when positive and clamped to `u32`.
pub(crate) fn positive_int(raw: Option<&str>) -> Option<u32> {
    raw.and_then(leading_int)
        .filter(|v| *v > 0)
        .map(|v| v.min(u32::MAX as i64) as u32)
}

/// Optional sign then ASCII digits after leading whitespace; trailing text is
/// ignored. Saturates on overflow.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub curr_page: u32,
    pub max_page: u64,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
    pub per_page: u32,
    pub record_count: u64,
}

impl Pagination {
    pub fn new(params: PageParams, record_count: u64) -> Self {
        let max_page = record_count.div_ceil(params.per_page.max(1) as u64);
        let curr = params.page as u64;
        let out_of_range = curr > max_page;
        let next_page = (curr < max_page).then(|| params.page + 1);
        let prev_page = (curr > 1 && !out_of_range).then(|| params.page - 1);
        Self {
            curr_page: params.page,
            max_page,
            next_page,
            prev_page,
            per_page: params.per_page,
            record_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageMeta {
    #[serde(flatten)]
    pub pagination: Pagination,
    #[serde(flatten)]
    pub span: SpanMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsPage {
    pub data: Vec<HostMetric>,
    pub meta: PageMeta,
}
