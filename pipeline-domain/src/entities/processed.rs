// Processed event entity
// Flat analytic record handed to the sink. Never carries the client IP.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDataEntry {
    pub key: String,
    pub value: Option<String>,
}

impl EventDataEntry {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedEvent {
    pub timestamp: DateTime<Utc>,
    pub client_timestamp: Option<DateTime<Utc>>,
    pub status_code: Option<i32>,
    pub event_type: String,
    pub duration_ms: Option<f64>,
    pub client_version: Option<String>,
    pub os_family: Option<String>,
    pub os_version: Option<String>,
    pub runtime_version: Option<String>,
    pub geo_country_code: Option<String>,
    pub geo_country: Option<String>,
    pub geo_region: Option<String>,
    pub geo_coordinates: Option<String>,
    pub event_data: Vec<EventDataEntry>,
}

impl ProcessedEvent {
    pub fn data_value(&self, key: &str) -> Option<&EventDataEntry> {
        self.event_data.iter().find(|entry| entry.key == key)
    }
}
