// Table and index DDL. Times are INTEGER unix milliseconds.

use sqlx::SqlitePool;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS api_requests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        time INTEGER NOT NULL,
        path TEXT NOT NULL,
        verb TEXT NOT NULL,
        response_status INTEGER,
        request_id TEXT,
        dt REAL,
        query_count INTEGER,
        error_class TEXT,
        error_message TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS background_jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        time INTEGER NOT NULL,
        job_class TEXT NOT NULL,
        jid TEXT,
        dt REAL,
        request_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS background_job_errors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        time INTEGER NOT NULL,
        job_class TEXT NOT NULL,
        jid TEXT,
        error_class TEXT,
        error_message TEXT,
        request_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS host_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        time INTEGER NOT NULL,
        total_system_mem INTEGER,
        free_system_mem INTEGER,
        pct_free_system_mem REAL,
        system_pct_cpu REAL,
        total_hdd INTEGER,
        free_hdd INTEGER,
        postgres_pct_cpu REAL,
        postgres_pct_mem REAL,
        ruby_pct_cpu REAL,
        ruby_pct_mem REAL,
        nginx_pct_cpu REAL,
        nginx_pct_mem REAL,
        elasticsearch_pct_cpu REAL,
        elasticsearch_pct_mem REAL,
        redis_pct_cpu REAL,
        redis_pct_mem REAL
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_api_requests_project_time ON api_requests(project_id, time)",
    "CREATE INDEX IF NOT EXISTS idx_background_jobs_project_time ON background_jobs(project_id, time)",
    "CREATE INDEX IF NOT EXISTS idx_background_job_errors_project_time ON background_job_errors(project_id, time)",
    "CREATE INDEX IF NOT EXISTS idx_host_metrics_project_time ON host_metrics(project_id, time)",
];

/// Creates every table and index that is not present yet.
pub async fn init_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    for ddl in TABLES.iter().chain(INDEXES) {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
