// Model serialization tests (flat series points, float timestamps, flattened page meta)

use chrono::DateTime;
use opsboard::models::*;

#[test]
fn test_series_point_serializes_flat_in_group_order() {
    let point = SeriesPoint {
        time: DateTime::from_timestamp(1_736_330_400, 0).unwrap(),
        values: vec![("success", 4i64), ("error", 1)],
    };
    let json = serde_json::to_string(&point).unwrap();
    assert_eq!(json, r#"{"time":1736330400,"success":4,"error":1}"#);
}

#[test]
fn test_history_response_carries_meta() {
    let response = HistoryResponse::<f64> {
        data: vec![],
        meta: SpanMeta {
            start_time: 1_736_326_800.0,
            end_time: 1_736_330_400.0,
        },
    };
    let json: serde_json::Value = serde_json::to_value(&response).unwrap();
    assert_eq!(json["data"], serde_json::json!([]));
    assert_eq!(json["meta"]["start_time"].as_f64(), Some(1_736_326_800.0));
}

#[test]
fn test_host_metric_time_is_fractional_seconds() {
    let metric = HostMetric {
        system_pct_cpu: Some(12.5),
        ..HostMetric::at(DateTime::from_timestamp_millis(1_736_330_400_250).unwrap())
    };
    let json: serde_json::Value = serde_json::to_value(&metric).unwrap();
    assert_eq!(json["time"].as_f64(), Some(1_736_330_400.25));
    assert!(json["free_hdd"].is_null());
    let back: HostMetric = serde_json::from_value(json).unwrap();
    assert_eq!(back, metric);
}

#[test]
fn test_metrics_page_meta_is_flat() {
    let params = PageParams { page: 1, per_page: 20 };
    let page = MetricsPage {
        data: vec![],
        meta: PageMeta {
            pagination: Pagination::new(params, 45),
            span: SpanMeta {
                start_time: 0.0,
                end_time: 60.0,
            },
        },
    };
    let json: serde_json::Value = serde_json::to_value(&page).unwrap();
    let meta = json["meta"].as_object().unwrap();
    for key in [
        "curr_page",
        "max_page",
        "next_page",
        "prev_page",
        "per_page",
        "record_count",
        "start_time",
        "end_time",
    ] {
        assert!(meta.contains_key(key), "missing {key}");
    }
    assert_eq!(meta["max_page"], 3);
    assert_eq!(meta["next_page"], 2);
    assert!(meta["prev_page"].is_null());
}
