// Gap-filled history series. Each point serializes flat:
// {"time": 1736294400, "1xx": 0, "2xx": 12, ...} with group keys in configured order.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint<V> {
    /// Bucket start.
    pub time: DateTime<Utc>,
    pub values: Vec<(&'static str, V)>,
}

impl<V> SeriesPoint<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(k, _)| *k)
    }
}

impl<V: Serialize> Serialize for SeriesPoint<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("time", &self.time.timestamp())?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub type Series<V> = Vec<SeriesPoint<V>>;

/// Resolved span in unix seconds; sent with every series so the x-axis renders
/// even when there are no points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpanMeta {
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryResponse<V: Serialize> {
    pub data: Series<V>,
    pub meta: SpanMeta,
}
