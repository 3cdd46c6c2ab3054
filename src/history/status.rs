// Response-status classes. The same range table drives the in-process mapping and
// the SQL CASE expression, so both always agree.

/// Closed range `low..=high` mapped to `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub key: &'static str,
    pub low: i64,
    pub high: i64,
}

pub const STATUS_RANGES: [StatusRange; 5] = [
    StatusRange { key: "1xx", low: 100, high: 199 },
    StatusRange { key: "2xx", low: 200, high: 299 },
    StatusRange { key: "3xx", low: 300, high: 399 },
    StatusRange { key: "4xx", low: 400, high: 499 },
    StatusRange { key: "5xx", low: 500, high: 599 },
];

pub const UNKNOWN_STATUS: &str = "unknown";

/// Group keys of a status-class series, in output order.
pub const STATUS_GROUPS: [&str; 5] = ["1xx", "2xx", "3xx", "4xx", "5xx"];

/// Ranges in evaluation order: lowest lower bound first (wins on overlap).
fn by_priority(ranges: &[StatusRange]) -> Vec<StatusRange> {
    let mut ordered = ranges.to_vec();
    ordered.sort_by_key(|r| r.low);
    ordered
}

pub fn classify(ranges: &[StatusRange], status: Option<i64>) -> &'static str {
    let Some(status) = status else {
        return UNKNOWN_STATUS;
    };
    by_priority(ranges)
        .into_iter()
        .find(|r| r.low <= status && status <= r.high)
        .map_or(UNKNOWN_STATUS, |r| r.key)
}

pub fn status_class(status: Option<i64>) -> &'static str {
    classify(&STATUS_RANGES, status)
}

/// `CASE WHEN col >= low AND col <= high THEN 'key' ... ELSE 'unknown' END`.
pub fn case_sql(ranges: &[StatusRange], column: &str) -> String {
    let mut sql = String::from("CASE");
    for r in by_priority(ranges) {
        sql.push_str(&format!(
            " WHEN {column} >= {} AND {column} <= {} THEN '{}'",
            r.low, r.high, r.key
        ));
    }
    sql.push_str(&format!(" ELSE '{UNKNOWN_STATUS}' END"));
    sql
}

pub fn status_case_sql(column: &str) -> String {
    case_sql(&STATUS_RANGES, column)
}
