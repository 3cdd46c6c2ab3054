// Bucketed reads over SQLite. Rows are assigned to
// origin + ((time - origin) / interval) * interval, all in unix milliseconds;
// time >= origin always holds, so integer division floors.

use async_trait::async_trait;
use sqlx::Row;
use tracing::instrument;

use super::{HistoryRepo, from_millis};
use crate::error::HistoryError;
use crate::history::percentile::reduce_by_bucket;
use crate::history::status::status_case_sql;
use crate::models::{HostMetric, PageParams};
use crate::store::{
    BucketCount, BucketPercentiles, BucketQuery, CountGrouping, CountQuery, ErrorFilter,
    EventStore,
};
use crate::timespan::TimeSpan;

const BUCKET_EXPR: &str = "($1 + ((time - $2) / $3) * $4)";

/// Shared WHERE clause; placeholders continue after the bucket expression.
const RANGE_FILTER: &str = "project_id = $5 AND time >= $6 AND time <= $7";

fn filter_sql(query: &CountQuery) -> Result<String, HistoryError> {
    let column = match (query.filter, query.source.error_column()) {
        (ErrorFilter::Any, _) => return Ok(String::new()),
        (_, Some(column)) => column,
        (_, None) => {
            return Err(HistoryError::Store(sqlx::Error::ColumnNotFound(
                "error_class".into(),
            )));
        }
    };
    Ok(match query.filter {
        ErrorFilter::Success => format!(" AND {column} IS NULL"),
        ErrorFilter::Failure => format!(" AND {column} IS NOT NULL"),
        ErrorFilter::Any => String::new(),
    })
}

fn count_sql(query: &CountQuery) -> Result<String, HistoryError> {
    let table = query.source.table();
    let filter = filter_sql(query)?;
    Ok(match query.grouping {
        CountGrouping::Total => format!(
            "SELECT {BUCKET_EXPR} AS bucket, COUNT(*) AS count FROM {table} \
             WHERE {RANGE_FILTER}{filter} GROUP BY bucket ORDER BY bucket"
        ),
        CountGrouping::StatusClass => format!(
            "SELECT {BUCKET_EXPR} AS bucket, {} AS grp, COUNT(*) AS count FROM {table} \
             WHERE {RANGE_FILTER}{filter} GROUP BY bucket, grp ORDER BY bucket, grp",
            status_case_sql("response_status")
        ),
    })
}

#[async_trait]
impl EventStore for HistoryRepo {
    #[instrument(skip(self, query), fields(repo = "history", operation = "count_by_bucket", table = query.source.table()))]
    async fn count_by_bucket(&self, query: &CountQuery) -> Result<Vec<BucketCount>, HistoryError> {
        let sql = count_sql(query)?;
        let range = &query.range;
        let origin = range.origin().timestamp_millis();
        let interval = range.bucket.interval_secs() * 1000;

        let rows = sqlx::query(&sql)
            .bind(origin)
            .bind(origin)
            .bind(interval)
            .bind(interval)
            .bind(range.project_id)
            .bind(range.span.start().timestamp_millis())
            .bind(range.span.end().timestamp_millis())
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let group = match query.grouping {
                CountGrouping::Total => None,
                CountGrouping::StatusClass => Some(row.try_get::<String, _>("grp")?),
            };
            out.push(BucketCount {
                bucket: from_millis(row.try_get("bucket")?)?,
                group,
                count: row.try_get("count")?,
            });
        }
        Ok(out)
    }

    #[instrument(skip(self, query), fields(repo = "history", operation = "percentiles_by_bucket"))]
    async fn percentiles_by_bucket(
        &self,
        query: &BucketQuery,
    ) -> Result<Vec<BucketPercentiles>, HistoryError> {
        let origin = query.origin().timestamp_millis();
        let interval = query.bucket.interval_secs() * 1000;
        let sql = format!(
            "SELECT {BUCKET_EXPR} AS bucket, dt FROM api_requests \
             WHERE {RANGE_FILTER} AND dt IS NOT NULL ORDER BY bucket, dt"
        );
        let rows = sqlx::query(&sql)
            .bind(origin)
            .bind(origin)
            .bind(interval)
            .bind(interval)
            .bind(query.project_id)
            .bind(query.span.start().timestamp_millis())
            .bind(query.span.end().timestamp_millis())
            .fetch_all(&self.pool)
            .await?;

        let mut samples = Vec::with_capacity(rows.len());
        for row in rows {
            samples.push((from_millis(row.try_get("bucket")?)?, row.try_get::<f64, _>("dt")?));
        }
        Ok(reduce_by_bucket(samples))
    }

    #[instrument(skip(self, span), fields(repo = "history", operation = "host_metrics_page"))]
    async fn host_metrics_page(
        &self,
        project_id: i64,
        span: &TimeSpan,
        page: PageParams,
        stride: Option<u32>,
    ) -> Result<(Vec<HostMetric>, u64), HistoryError> {
        let start = span.start().timestamp_millis();
        let end = span.end().timestamp_millis();
        let limit = page.limit();
        let offset = page.offset();

        let (total, rows) = match stride {
            Some(n) => {
                let ranked = "WITH ranked AS (\
                     SELECT *, ROW_NUMBER() OVER (ORDER BY time ASC, id ASC) AS rn FROM host_metrics \
                     WHERE project_id = $1 AND time >= $2 AND time <= $3)";
                let total: i64 = sqlx::query_scalar(&format!(
                    "{ranked} SELECT COUNT(*) FROM ranked WHERE (rn - 1) % $4 = 0"
                ))
                .bind(project_id)
                .bind(start)
                .bind(end)
                .bind(n as i64)
                .fetch_one(&self.pool)
                .await?;
                let rows = sqlx::query(&format!(
                    "{ranked} SELECT * FROM ranked WHERE (rn - 1) % $4 = 0 ORDER BY rn LIMIT $5 OFFSET $6"
                ))
                .bind(project_id)
                .bind(start)
                .bind(end)
                .bind(n as i64)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                (total, rows)
            }
            None => {
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM host_metrics WHERE project_id = $1 AND time >= $2 AND time <= $3",
                )
                .bind(project_id)
                .bind(start)
                .bind(end)
                .fetch_one(&self.pool)
                .await?;
                let rows = sqlx::query(
                    "SELECT * FROM host_metrics WHERE project_id = $1 AND time >= $2 AND time <= $3 \
                     ORDER BY time ASC, id ASC LIMIT $4 OFFSET $5",
                )
                .bind(project_id)
                .bind(start)
                .bind(end)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                (total, rows)
            }
        };

        let metrics = rows
            .iter()
            .map(HistoryRepo::parse_host_metric_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((metrics, total.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EventSource;
    use crate::timespan::TimeBucket;
    use chrono::DateTime;

    fn query(source: EventSource, grouping: CountGrouping, filter: ErrorFilter) -> CountQuery {
        let span = TimeSpan::new(
            DateTime::from_timestamp(0, 0).unwrap(),
            DateTime::from_timestamp(3600, 0).unwrap(),
        );
        CountQuery {
            source,
            range: BucketQuery { project_id: 1, span, bucket: TimeBucket::parse("5m").unwrap() },
            grouping,
            filter,
        }
    }

    #[test]
    fn success_filter_checks_error_indicator() {
        let sql = count_sql(&query(
            EventSource::ApiRequests,
            CountGrouping::Total,
            ErrorFilter::Success,
        ))
        .unwrap();
        assert!(sql.contains("error_class IS NULL"));
        assert!(sql.contains("FROM api_requests"));
    }

    #[test]
    fn status_grouping_uses_case_expression() {
        let sql = count_sql(&query(
            EventSource::ApiRequests,
            CountGrouping::StatusClass,
            ErrorFilter::Any,
        ))
        .unwrap();
        assert!(sql.contains("CASE WHEN response_status"));
        assert!(sql.contains("GROUP BY bucket, grp"));
    }

    #[test]
    fn filtering_a_table_without_error_column_fails() {
        let err = count_sql(&query(
            EventSource::BackgroundJobs,
            CountGrouping::Total,
            ErrorFilter::Failure,
        ))
        .unwrap_err();
        assert!(matches!(err, HistoryError::Store(_)));
    }
}
