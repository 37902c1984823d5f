use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// A pod observed during discovery, waiting for its first log line to show up in Loki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRecord {
    pub namespace: String,
    pub pod_name: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl PodRecord {
    /// `namespace/pod_name`, the key used for dedup and pending tracking.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.pod_name)
    }
}

/// A pod as reported by the orchestrator listing.
#[derive(Debug, Clone)]
pub struct PodSummary {
    pub name: String,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Frame pushed by Loki's `/loki/api/v1/tail` websocket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub streams: Vec<TailStream>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dropped_entries: Vec<DroppedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TailStream {
    #[serde(default)]
    pub stream: BTreeMap<String, String>,
    // [timestamp_ns, line] pairs, both encoded as strings
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DroppedEntry {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub timestamp: String,
}

// Loki sends `"dropped_entries": null` rather than omitting the key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
