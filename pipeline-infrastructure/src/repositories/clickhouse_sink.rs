use anyhow::anyhow;
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::Serialize;
use time::OffsetDateTime;

use pipeline_domain::ports::EventSink;
use pipeline_domain::{ProcessedEvent, SinkError};

use crate::utils::to_offset_datetime;

#[derive(Debug, Clone, Serialize, Row)]
pub struct ProcessedEventRow {
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub timestamp: OffsetDateTime,
    #[serde(with = "clickhouse::serde::time::datetime64::millis::option")]
    pub client_timestamp: Option<OffsetDateTime>,
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
    pub event_data: Vec<(String, Option<String>)>,
}

impl From<&ProcessedEvent> for ProcessedEventRow {
    fn from(event: &ProcessedEvent) -> Self {
        Self {
            timestamp: to_offset_datetime(&event.timestamp),
            client_timestamp: event.client_timestamp.as_ref().map(to_offset_datetime),
            status_code: event.status_code,
            event_type: event.event_type.clone(),
            duration_ms: event.duration_ms,
            client_version: event.client_version.clone(),
            os_family: event.os_family.clone(),
            os_version: event.os_version.clone(),
            runtime_version: event.runtime_version.clone(),
            geo_country_code: event.geo_country_code.clone(),
            geo_country: event.geo_country.clone(),
            geo_region: event.geo_region.clone(),
            geo_coordinates: event.geo_coordinates.clone(),
            event_data: event
                .event_data
                .iter()
                .map(|entry| (entry.key.clone(), entry.value.clone()))
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct ClickhouseEventSink {
    client: Client,
    database: String,
    table: String,
}

impl ClickhouseEventSink {
    pub fn new(client: Client, database: String, table: String) -> Self {
        Self {
            client,
            database,
            table,
        }
    }

    fn create_table_sql(&self) -> String {
        format!(
            r#"
CREATE TABLE IF NOT EXISTS {} (
    timestamp DateTime64(3),
    client_timestamp Nullable(DateTime64(3)),
    status_code Nullable(Int32),
    event_type LowCardinality(String),
    duration_ms Nullable(Float64),
    client_version Nullable(String),
    os_family Nullable(String),
    os_version Nullable(String),
    runtime_version Nullable(String),
    geo_country_code Nullable(String),
    geo_country Nullable(String),
    geo_region Nullable(String),
    geo_coordinates Nullable(String),
    event_data Array(Tuple(key String, value Nullable(String)))
) ENGINE = MergeTree
PARTITION BY toYYYYMM(timestamp)
ORDER BY (event_type, timestamp)
"#,
            self.table
        )
    }
}

#[async_trait]
impl EventSink for ClickhouseEventSink {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;
        self.client.query(&self.create_table_sql()).execute().await?;
        Ok(())
    }

    async fn insert_events(&self, events: &[ProcessedEvent]) -> Result<(), SinkError> {
        if events.is_empty() {
            return Ok(());
        }
        let count = events.len();
        let mut insert = self
            .client
            .insert(&self.table)
            .map_err(|err| sink_error(err, count))?;
        for event in events {
            insert
                .write(&ProcessedEventRow::from(event))
                .await
                .map_err(|err| sink_error(err, count))?;
        }
        insert.end().await.map_err(|err| sink_error(err, count))?;
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

/// The server answering with an error means the rows were refused; anything
/// else is a transport problem.
fn sink_error(err: clickhouse::error::Error, count: usize) -> SinkError {
    match err {
        clickhouse::error::Error::BadResponse(reason) => SinkError::Rejected {
            rejected: count,
            reason,
        },
        other => SinkError::Unavailable(anyhow!(other)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use pipeline_domain::EventDataEntry;

    use super::*;

    fn processed() -> ProcessedEvent {
        ProcessedEvent {
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T10:00:00.125Z")
                .expect("timestamp")
                .with_timezone(&Utc),
            client_timestamp: None,
            status_code: Some(200),
            event_type: "export".to_string(),
            duration_ms: Some(12.5),
            client_version: Some("3.1.0".to_string()),
            os_family: None,
            os_version: None,
            runtime_version: None,
            geo_country_code: Some("US".to_string()),
            geo_country: Some("United States".to_string()),
            geo_region: Some("CA".to_string()),
            geo_coordinates: Some("37.751,-97.822".to_string()),
            event_data: vec![
                EventDataEntry::new("a", Some("1".to_string())),
                EventDataEntry::new("source_name", None),
            ],
        }
    }

    #[test]
    fn row_keeps_event_data_order_and_nulls() {
        let row = ProcessedEventRow::from(&processed());
        assert_eq!(
            row.event_data,
            vec![
                ("a".to_string(), Some("1".to_string())),
                ("source_name".to_string(), None),
            ]
        );
        assert_eq!(row.timestamp.millisecond(), 125);
        assert!(row.client_timestamp.is_none());
    }

    #[test]
    fn bad_response_maps_to_rejected() {
        let err = sink_error(
            clickhouse::error::Error::BadResponse("Code: 16. No such column".to_string()),
            3,
        );
        match err {
            SinkError::Rejected { rejected, reason } => {
                assert_eq!(rejected, 3);
                assert!(reason.contains("No such column"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn schema_targets_configured_table() {
        let sink = ClickhouseEventSink::new(
            Client::default(),
            "glyphtrace".to_string(),
            "font_events".to_string(),
        );
        let sql = sink.create_table_sql();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS font_events"));
        assert!(sql.contains("Array(Tuple(key String, value Nullable(String)))"));
    }
}
