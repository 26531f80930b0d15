use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clickhouse::Client;

use pipeline_application::ops::SourceAttributionCache;
use pipeline_application::{AppState, Metrics};
use pipeline_domain::ports::EventSink;
use pipeline_domain::FeedConfig;
use pipeline_infrastructure::{
    AppConfig, CidrGeoResolver, ClickhouseEventSink, CountryTable, HttpSourceNameFetcher,
};

pub struct AppContext {
    pub state: AppState,
    pub feed_config: FeedConfig,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let mut clickhouse = Client::default()
            .with_url(&db_config.clickhouse_url)
            .with_database(&db_config.clickhouse_database);
        if let Some(user) = &db_config.clickhouse_user {
            clickhouse = clickhouse.with_user(user);
        }
        if let Some(password) = &db_config.clickhouse_password {
            clickhouse = clickhouse.with_password(password);
        }

        let sink = Arc::new(ClickhouseEventSink::new(
            clickhouse,
            db_config.clickhouse_database.clone(),
            db_config.clickhouse_table.clone(),
        ));
        sink.ensure_schema().await?;

        let geo_resolver = CidrGeoResolver::load(&runtime_config.geo_database_path).await?;
        let country_directory = CountryTable::load(&runtime_config.country_table_path).await?;

        let metrics = Arc::new(Metrics::default());
        let fetch_timeout = Duration::from_millis(runtime_config.attribution_timeout_ms);
        let fetcher = Arc::new(HttpSourceNameFetcher::new(fetch_timeout)?);
        let source_names = Arc::new(SourceAttributionCache::new(
            fetcher,
            fetch_timeout,
            metrics.clone(),
        ));

        let state = AppState {
            config: runtime_config,
            geo_resolver: Arc::new(geo_resolver),
            country_directory: Arc::new(country_directory),
            source_names,
            event_sink: sink,
            metrics,
        };

        Ok(Self {
            state,
            feed_config: config.to_feed_config(),
        })
    }
}
