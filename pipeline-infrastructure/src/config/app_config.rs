use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;

use pipeline_domain::{DbConfig, FeedConfig, RuntimeConfig};

use crate::config::validation::validate_identifier;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub nats_url: String,
    pub nats_stream: String,
    pub nats_consumer: String,
    pub nats_subject: String,
    pub nats_ack_wait_seconds: u64,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub clickhouse_table: String,
    pub geo_database_path: String,
    pub country_table_path: String,
    pub attribution_timeout_ms: u64,
    pub max_in_flight: usize,
    pub request_timeout_seconds: u64,
    pub max_decoded_bytes: usize,
    pub log_format: String,
    /// File the settings were read from; `None` when running on defaults.
    #[serde(skip)]
    pub loaded_from: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9464".to_string(),
            api_token: None,
            nats_url: "nats://127.0.0.1:4222".to_string(),
            nats_stream: "TELEMETRY".to_string(),
            nats_consumer: "glyphtrace-ingest".to_string(),
            nats_subject: "telemetry.events".to_string(),
            nats_ack_wait_seconds: 30,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "glyphtrace".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            clickhouse_table: "events".to_string(),
            geo_database_path: "./geo_networks.csv".to_string(),
            country_table_path: "./countries.csv".to_string(),
            attribution_timeout_ms: 3_000,
            max_in_flight: 64,
            request_timeout_seconds: 5,
            max_decoded_bytes: 4 * 1024 * 1024,
            log_format: "text".to_string(),
            loaded_from: None,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("GLYPHTRACE_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            let mut config = Self::from_toml(&content)?;
            config.loaded_from = Some(path.clone());
            config
        } else {
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn normalize(&mut self) {
        self.api_token = normalize_optional(self.api_token.take());
        self.clickhouse_user = normalize_optional(self.clickhouse_user.take());
        self.clickhouse_password = normalize_optional(self.clickhouse_password.take());
        self.log_format = self.log_format.trim().to_lowercase();
        self.nats_subject = self.nats_subject.trim().to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.geo_database_path = resolve_path(base, &self.geo_database_path);
        self.country_table_path = resolve_path(base, &self.country_table_path);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        validate_identifier("clickhouse_database", &self.clickhouse_database)?;
        validate_identifier("clickhouse_table", &self.clickhouse_table)?;
        if self.nats_stream.trim().is_empty() || self.nats_consumer.trim().is_empty() {
            return Err(anyhow!("nats_stream and nats_consumer must not be empty"));
        }
        if self.nats_subject.is_empty() {
            return Err(anyhow!("nats_subject must not be empty"));
        }
        if self.attribution_timeout_ms == 0 {
            return Err(anyhow!("attribution_timeout_ms must be greater than 0"));
        }
        if self.max_in_flight == 0 {
            return Err(anyhow!("max_in_flight must be greater than 0"));
        }
        if self.max_decoded_bytes == 0 {
            return Err(anyhow!("max_decoded_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 || self.nats_ack_wait_seconds == 0 {
            return Err(anyhow!(
                "request_timeout_seconds and nats_ack_wait_seconds must be greater than 0"
            ));
        }
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(anyhow!(
                "log_format must be 'text' or 'json', got '{}'",
                self.log_format
            ));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            geo_database_path: self.geo_database_path.clone(),
            country_table_path: self.country_table_path.clone(),
            attribution_timeout_ms: self.attribution_timeout_ms,
            max_in_flight: self.max_in_flight,
            request_timeout_seconds: self.request_timeout_seconds,
            max_decoded_bytes: self.max_decoded_bytes,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
            clickhouse_table: self.clickhouse_table.clone(),
        }
    }

    pub fn to_feed_config(&self) -> FeedConfig {
        FeedConfig {
            nats_url: self.nats_url.clone(),
            stream: self.nats_stream.clone(),
            consumer: self.nats_consumer.clone(),
            subject: self.nats_subject.clone(),
            ack_wait_seconds: self.nats_ack_wait_seconds,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("GLYPHTRACE_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("GLYPHTRACE_NATS_URL") {
            self.nats_url = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_NATS_STREAM") {
            self.nats_stream = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_NATS_CONSUMER") {
            self.nats_consumer = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_NATS_SUBJECT") {
            self.nats_subject = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_NATS_ACK_WAIT_SECONDS") {
            self.nats_ack_wait_seconds = value.parse().unwrap_or(self.nats_ack_wait_seconds);
        }
        if let Ok(value) = env::var("GLYPHTRACE_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Ok(value) = env::var("GLYPHTRACE_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Ok(value) = env::var("GLYPHTRACE_CLICKHOUSE_TABLE") {
            self.clickhouse_table = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_GEO_DATABASE_PATH") {
            self.geo_database_path = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_COUNTRY_TABLE_PATH") {
            self.country_table_path = value;
        }
        if let Ok(value) = env::var("GLYPHTRACE_ATTRIBUTION_TIMEOUT_MS") {
            self.attribution_timeout_ms = value.parse().unwrap_or(self.attribution_timeout_ms);
        }
        if let Ok(value) = env::var("GLYPHTRACE_MAX_IN_FLIGHT") {
            self.max_in_flight = value.parse().unwrap_or(self.max_in_flight);
        }
        if let Ok(value) = env::var("GLYPHTRACE_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("GLYPHTRACE_MAX_DECODED_BYTES") {
            self.max_decoded_bytes = value.parse().unwrap_or(self.max_decoded_bytes);
        }
        if let Ok(value) = env::var("GLYPHTRACE_LOG_FORMAT") {
            self.log_format = value;
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
