// Stored event rows. The history core only reads `time` plus a few grouping columns
// (response_status, error_class, dt); the rest is carried for the list views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::unix_seconds;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    #[serde(with = "unix_seconds")]
    pub time: DateTime<Utc>,
    pub path: String,
    pub verb: String,
    pub response_status: Option<i64>,
    pub request_id: Option<String>,
    /// Request duration in seconds.
    pub dt: Option<f64>,
    pub query_count: Option<i64>,
    pub error_class: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundJob {
    #[serde(with = "unix_seconds")]
    pub time: DateTime<Utc>,
    pub job_class: String,
    pub jid: Option<String>,
    /// Job duration in seconds.
    pub dt: Option<f64>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundJobError {
    #[serde(with = "unix_seconds")]
    pub time: DateTime<Utc>,
    pub job_class: String,
    pub jid: Option<String>,
    pub error_class: Option<String>,
    pub error_message: Option<String>,
    pub request_id: Option<String>,
}

/// One host sample, nominally every 30 seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMetric {
    #[serde(with = "unix_seconds")]
    pub time: DateTime<Utc>,
    pub total_system_mem: Option<i64>,
    pub free_system_mem: Option<i64>,
    pub pct_free_system_mem: Option<f64>,
    pub system_pct_cpu: Option<f64>,
    pub total_hdd: Option<i64>,
    pub free_hdd: Option<i64>,
    pub postgres_pct_cpu: Option<f64>,
    pub postgres_pct_mem: Option<f64>,
    pub ruby_pct_cpu: Option<f64>,
    pub ruby_pct_mem: Option<f64>,
    pub nginx_pct_cpu: Option<f64>,
    pub nginx_pct_mem: Option<f64>,
    pub elasticsearch_pct_cpu: Option<f64>,
    pub elasticsearch_pct_mem: Option<f64>,
    pub redis_pct_cpu: Option<f64>,
    pub redis_pct_mem: Option<f64>,
}

impl HostMetric {
    /// Sample at `time` with every reading empty.
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }
}
