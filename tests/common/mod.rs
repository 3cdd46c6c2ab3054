// Shared test helpers: a throwaway SQLite store with one project, plus row builders

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use opsboard::history_repo::HistoryRepo;
use opsboard::models::*;
use std::sync::Arc;
use tempfile::TempDir;

/// 2025-01-08T10:00:00Z
pub const BASE_SECS: i64 = 1_736_330_400;

pub struct TestRepo {
    pub repo: Arc<HistoryRepo>,
    pub project: Project,
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
}

pub async fn temp_repo() -> TestRepo {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.db");
    let repo = HistoryRepo::connect(path.to_str().unwrap(), 2).await.unwrap();
    repo.init().await.unwrap();
    let project = repo.create_project("acme", "Acme").await.unwrap();
    TestRepo {
        repo: Arc::new(repo),
        project,
        _dir: dir,
    }
}

pub fn base() -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_SECS, 0).unwrap()
}

/// `base() + minutes`.
pub fn at_min(minutes: i64) -> DateTime<Utc> {
    base() + Duration::minutes(minutes)
}

pub fn request(time: DateTime<Utc>, status: Option<i64>) -> ApiRequest {
    ApiRequest {
        time,
        path: "/api/widgets".into(),
        verb: "GET".into(),
        response_status: status,
        request_id: None,
        dt: None,
        query_count: None,
        error_class: None,
        error_message: None,
    }
}

pub fn failed_request(time: DateTime<Utc>, error_class: &str) -> ApiRequest {
    ApiRequest {
        error_class: Some(error_class.into()),
        error_message: Some("boom".into()),
        ..request(time, Some(500))
    }
}

pub fn timed_request(time: DateTime<Utc>, dt: f64) -> ApiRequest {
    ApiRequest {
        dt: Some(dt),
        ..request(time, Some(200))
    }
}

pub fn job(time: DateTime<Utc>) -> BackgroundJob {
    BackgroundJob {
        time,
        job_class: "ReportJob".into(),
        jid: None,
        dt: Some(0.5),
        request_id: None,
    }
}

pub fn job_error(time: DateTime<Utc>) -> BackgroundJobError {
    BackgroundJobError {
        time,
        job_class: "ReportJob".into(),
        jid: None,
        error_class: Some("Timeout".into()),
        error_message: Some("took too long".into()),
        request_id: None,
    }
}

/// `count` host samples every `spacing_secs`, starting at `base()`.
pub fn host_metrics(count: i64, spacing_secs: i64) -> Vec<HostMetric> {
    (0..count)
        .map(|i| HostMetric {
            system_pct_cpu: Some(i as f64),
            ..HostMetric::at(base() + Duration::seconds(i * spacing_secs))
        })
        .collect()
}
