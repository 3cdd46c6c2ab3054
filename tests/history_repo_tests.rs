// HistoryRepo tests: connect, init, projects, batch inserts, grouped reads

mod common;

use common::*;
use opsboard::error::HistoryError;
use opsboard::history_repo::HistoryRepo;
use opsboard::store::{
    BucketQuery, CountGrouping, CountQuery, ErrorFilter, EventSource, EventStore,
};
use opsboard::timespan::{TimeBucket, TimeSpan};
use tempfile::TempDir;

fn count_query(project_id: i64, source: EventSource, filter: ErrorFilter) -> CountQuery {
    CountQuery {
        source,
        range: BucketQuery {
            project_id,
            span: TimeSpan::new(at_min(0), at_min(60)),
            bucket: TimeBucket::parse("15m").unwrap(),
        },
        grouping: CountGrouping::Total,
        filter,
    }
}

#[tokio::test]
async fn history_repo_connect_and_init() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("history.db");
    let path_str = path.to_str().unwrap();

    let repo = HistoryRepo::connect(path_str, 2).await.unwrap();
    repo.init().await.unwrap();
    // Second init is no-op (IF NOT EXISTS)
    repo.init().await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn projects_are_found_by_slug() {
    let t = temp_repo().await;
    let found = t.repo.find_project("acme").await.unwrap();
    assert_eq!(found, Some(t.project.clone()));
    assert_eq!(t.repo.find_project("nope").await.unwrap(), None);
    assert!(t.repo.create_project("acme", "Again").await.is_err());
}

#[tokio::test]
async fn empty_batches_are_noops() {
    let t = temp_repo().await;
    t.repo.insert_api_requests(t.project.id, &[]).await.unwrap();
    t.repo.insert_host_metrics(t.project.id, &[]).await.unwrap();
    let rows = t
        .repo
        .count_by_bucket(&count_query(t.project.id, EventSource::ApiRequests, ErrorFilter::Any))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn count_by_bucket_returns_only_observed_buckets() {
    let t = temp_repo().await;
    t.repo
        .insert_api_requests(
            t.project.id,
            &[
                request(at_min(1), Some(200)),
                request(at_min(14), Some(200)),
                failed_request(at_min(50), "IOError"),
            ],
        )
        .await
        .unwrap();

    let rows = t
        .repo
        .count_by_bucket(&count_query(t.project.id, EventSource::ApiRequests, ErrorFilter::Any))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].bucket, at_min(0));
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[0].group, None);
    assert_eq!(rows[1].bucket, at_min(45));

    let failures = t
        .repo
        .count_by_bucket(&count_query(t.project.id, EventSource::ApiRequests, ErrorFilter::Failure))
        .await
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].count, 1);
}

#[tokio::test]
async fn status_grouping_labels_rows() {
    let t = temp_repo().await;
    t.repo
        .insert_api_requests(
            t.project.id,
            &[request(at_min(1), Some(204)), request(at_min(2), None)],
        )
        .await
        .unwrap();

    let mut query = count_query(t.project.id, EventSource::ApiRequests, ErrorFilter::Any);
    query.grouping = CountGrouping::StatusClass;
    let rows = t.repo.count_by_bucket(&query).await.unwrap();
    let groups: Vec<_> = rows.iter().map(|r| r.group.as_deref().unwrap()).collect();
    assert_eq!(groups, vec!["2xx", "unknown"]);
}

#[tokio::test]
async fn error_filter_on_jobs_table_is_a_store_error() {
    let t = temp_repo().await;
    let err = t
        .repo
        .count_by_bucket(&count_query(
            t.project.id,
            EventSource::BackgroundJobs,
            ErrorFilter::Success,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, HistoryError::Store(_)));
}

#[tokio::test]
async fn percentiles_skip_missing_durations() {
    let t = temp_repo().await;
    t.repo
        .insert_api_requests(
            t.project.id,
            &[
                timed_request(at_min(20), 2.0),
                request(at_min(21), Some(200)),
                timed_request(at_min(40), 1.0),
            ],
        )
        .await
        .unwrap();

    let query = count_query(t.project.id, EventSource::ApiRequests, ErrorFilter::Any).range;
    let rows = t.repo.percentiles_by_bucket(&query).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].bucket, at_min(15));
    assert_eq!(rows[0].p50, 2.0);
    assert_eq!(rows[1].bucket, at_min(30));
    assert_eq!(rows[1].p99, 1.0);
}
