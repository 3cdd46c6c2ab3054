// Host-metric downsampling: SQL ranking vs in-process stride, pagination exactness

mod common;

use chrono::Duration;
use common::*;
use opsboard::downsample::{self, list_host_metrics, select_stride, stride_count};
use opsboard::models::{PageParams, Pagination};
use opsboard::timespan::TimeSpan;

fn hour_span() -> TimeSpan {
    TimeSpan::new(at_min(0), at_min(60) - Duration::seconds(1))
}

#[tokio::test]
async fn hour_at_five_minute_spacing_keeps_twelve_rows() {
    let t = temp_repo().await;
    t.repo
        .insert_host_metrics(t.project.id, &host_metrics(120, 30))
        .await
        .unwrap();

    let (rows, total) = list_host_metrics(
        t.repo.as_ref(),
        t.project.id,
        &hour_span(),
        Some(300),
        30,
        PageParams::default(),
    )
    .await
    .unwrap();

    assert_eq!(total, 12);
    assert_eq!(rows.len(), 12);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.time, at_min(5 * i as i64));
        assert_eq!(row.system_pct_cpu, Some((10 * i) as f64));
    }
}

#[tokio::test]
async fn store_selection_matches_in_process_stride() {
    let t = temp_repo().await;
    let metrics = host_metrics(97, 30);
    t.repo.insert_host_metrics(t.project.id, &metrics).await.unwrap();
    let span = TimeSpan::new(at_min(0), at_min(120));

    for min_spacing in [31, 60, 95, 300, 900] {
        let n = downsample::stride(Some(min_spacing), 30).unwrap();
        let expected = select_stride(metrics.clone(), n);
        let page = PageParams { page: 1, per_page: 1000 };
        let (rows, total) =
            list_host_metrics(t.repo.as_ref(), t.project.id, &span, Some(min_spacing), 30, page)
                .await
                .unwrap();
        assert_eq!(total, stride_count(97, n), "min_spacing {min_spacing}");
        assert_eq!(rows, expected, "min_spacing {min_spacing}");
    }
}

#[tokio::test]
async fn pages_partition_the_selection() {
    let t = temp_repo().await;
    t.repo
        .insert_host_metrics(t.project.id, &host_metrics(120, 30))
        .await
        .unwrap();

    let mut seen = Vec::new();
    for page in 1..=3 {
        let params = PageParams { page, per_page: 5 };
        let (rows, total) =
            list_host_metrics(t.repo.as_ref(), t.project.id, &hour_span(), Some(300), 30, params)
                .await
                .unwrap();
        assert_eq!(total, 12);
        let meta = Pagination::new(params, total);
        assert_eq!(meta.max_page, 3);
        seen.extend(rows.into_iter().map(|r| r.time));
    }
    let expected: Vec<_> = (0..12).map(|i| at_min(5 * i)).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn no_downsampling_at_native_spacing() {
    let t = temp_repo().await;
    t.repo
        .insert_host_metrics(t.project.id, &host_metrics(45, 30))
        .await
        .unwrap();

    let params = PageParams { page: 3, per_page: 20 };
    let (rows, total) =
        list_host_metrics(t.repo.as_ref(), t.project.id, &hour_span(), Some(30), 30, params)
            .await
            .unwrap();
    assert_eq!(total, 45);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].time, base() + Duration::seconds(40 * 30));
}

#[tokio::test]
async fn empty_range_has_no_pages() {
    let t = temp_repo().await;
    let (rows, total) = list_host_metrics(
        t.repo.as_ref(),
        t.project.id,
        &hour_span(),
        Some(600),
        30,
        PageParams::default(),
    )
    .await
    .unwrap();
    assert!(rows.is_empty());
    assert_eq!(total, 0);
    let meta = Pagination::new(PageParams::default(), total);
    assert_eq!(meta.max_page, 0);
    assert_eq!(meta.next_page, None);
}
