use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub data_store: String,
    pub data_store_reachable: bool,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}
