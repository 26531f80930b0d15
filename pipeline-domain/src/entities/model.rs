use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub geo_database_path: String,
    pub country_table_path: String,
    pub attribution_timeout_ms: u64,
    pub max_in_flight: usize,
    pub request_timeout_seconds: u64,
    /// Upper bound on a message body after gzip inflation.
    pub max_decoded_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9464".to_string(),
            api_token: None,
            geo_database_path: "./geo_networks.csv".to_string(),
            country_table_path: "./countries.csv".to_string(),
            attribution_timeout_ms: 3_000,
            max_in_flight: 64,
            request_timeout_seconds: 5,
            max_decoded_bytes: 4 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub clickhouse_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub nats_url: String,
    pub stream: String,
    pub consumer: String,
    pub subject: String,
    pub ack_wait_seconds: u64,
}
