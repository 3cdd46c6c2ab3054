// SQLite event store. Holds the four event families per project; the bucketed
// read path lives in `queries` (EventStore impl).

mod queries;
mod schema;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::instrument;

use crate::error::HistoryError;
use crate::models::{ApiRequest, BackgroundJob, BackgroundJobError, HostMetric, Project};

pub struct HistoryRepo {
    pool: SqlitePool,
}

impl HistoryRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        schema::init_tables(&self.pool).await
    }

    #[instrument(skip(self), fields(repo = "history", operation = "create_project"))]
    pub async fn create_project(&self, slug: &str, name: &str) -> anyhow::Result<Project> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO projects (slug, name) VALUES ($1, $2) RETURNING id")
                .bind(slug)
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(Project {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
        })
    }

    pub async fn find_project(&self, slug: &str) -> Result<Option<Project>, HistoryError> {
        let row = sqlx::query("SELECT id, slug, name FROM projects WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Project {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            name: row.try_get("name")?,
        }))
    }

    #[instrument(skip(self, rows), fields(repo = "history", operation = "insert_api_requests", rows_count = rows.len()))]
    pub async fn insert_api_requests(
        &self,
        project_id: i64,
        rows: &[ApiRequest],
    ) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in rows {
            sqlx::query(
                "INSERT INTO api_requests (project_id, time, path, verb, response_status, request_id, dt, query_count, error_class, error_message) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(project_id)
            .bind(r.time.timestamp_millis())
            .bind(&r.path)
            .bind(&r.verb)
            .bind(r.response_status)
            .bind(&r.request_id)
            .bind(r.dt)
            .bind(r.query_count)
            .bind(&r.error_class)
            .bind(&r.error_message)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, rows), fields(repo = "history", operation = "insert_background_jobs", rows_count = rows.len()))]
    pub async fn insert_background_jobs(
        &self,
        project_id: i64,
        rows: &[BackgroundJob],
    ) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in rows {
            sqlx::query(
                "INSERT INTO background_jobs (project_id, time, job_class, jid, dt, request_id) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(project_id)
            .bind(r.time.timestamp_millis())
            .bind(&r.job_class)
            .bind(&r.jid)
            .bind(r.dt)
            .bind(&r.request_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, rows), fields(repo = "history", operation = "insert_background_job_errors", rows_count = rows.len()))]
    pub async fn insert_background_job_errors(
        &self,
        project_id: i64,
        rows: &[BackgroundJobError],
    ) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for r in rows {
            sqlx::query(
                "INSERT INTO background_job_errors (project_id, time, job_class, jid, error_class, error_message, request_id) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(project_id)
            .bind(r.time.timestamp_millis())
            .bind(&r.job_class)
            .bind(&r.jid)
            .bind(&r.error_class)
            .bind(&r.error_message)
            .bind(&r.request_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, rows), fields(repo = "history", operation = "insert_host_metrics", rows_count = rows.len()))]
    pub async fn insert_host_metrics(
        &self,
        project_id: i64,
        rows: &[HostMetric],
    ) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for m in rows {
            sqlx::query(
                r#"
                INSERT INTO host_metrics
                (project_id, time, total_system_mem, free_system_mem, pct_free_system_mem, system_pct_cpu,
                 total_hdd, free_hdd, postgres_pct_cpu, postgres_pct_mem, ruby_pct_cpu, ruby_pct_mem,
                 nginx_pct_cpu, nginx_pct_mem, elasticsearch_pct_cpu, elasticsearch_pct_mem,
                 redis_pct_cpu, redis_pct_mem)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
                "#,
            )
            .bind(project_id)
            .bind(m.time.timestamp_millis())
            .bind(m.total_system_mem)
            .bind(m.free_system_mem)
            .bind(m.pct_free_system_mem)
            .bind(m.system_pct_cpu)
            .bind(m.total_hdd)
            .bind(m.free_hdd)
            .bind(m.postgres_pct_cpu)
            .bind(m.postgres_pct_mem)
            .bind(m.ruby_pct_cpu)
            .bind(m.ruby_pct_mem)
            .bind(m.nginx_pct_cpu)
            .bind(m.nginx_pct_mem)
            .bind(m.elasticsearch_pct_cpu)
            .bind(m.elasticsearch_pct_mem)
            .bind(m.redis_pct_cpu)
            .bind(m.redis_pct_mem)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    fn parse_host_metric_row(row: &SqliteRow) -> Result<HostMetric, HistoryError> {
        Ok(HostMetric {
            time: from_millis(row.try_get("time")?)?,
            total_system_mem: row.try_get("total_system_mem")?,
            free_system_mem: row.try_get("free_system_mem")?,
            pct_free_system_mem: row.try_get("pct_free_system_mem")?,
            system_pct_cpu: row.try_get("system_pct_cpu")?,
            total_hdd: row.try_get("total_hdd")?,
            free_hdd: row.try_get("free_hdd")?,
            postgres_pct_cpu: row.try_get("postgres_pct_cpu")?,
            postgres_pct_mem: row.try_get("postgres_pct_mem")?,
            ruby_pct_cpu: row.try_get("ruby_pct_cpu")?,
            ruby_pct_mem: row.try_get("ruby_pct_mem")?,
            nginx_pct_cpu: row.try_get("nginx_pct_cpu")?,
            nginx_pct_mem: row.try_get("nginx_pct_mem")?,
            elasticsearch_pct_cpu: row.try_get("elasticsearch_pct_cpu")?,
            elasticsearch_pct_mem: row.try_get("elasticsearch_pct_mem")?,
            redis_pct_cpu: row.try_get("redis_pct_cpu")?,
            redis_pct_mem: row.try_get("redis_pct_mem")?,
        })
    }
}

/// Stored unix milliseconds back to an instant.
fn from_millis(ms: i64) -> Result<DateTime<Utc>, HistoryError> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        HistoryError::Store(sqlx::Error::Decode(
            format!("timestamp out of range: {ms}").into(),
        ))
    })
}
