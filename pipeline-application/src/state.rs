use std::sync::Arc;

use pipeline_domain::ports::{CountryDirectory, EventSink, GeoResolver};
use pipeline_domain::RuntimeConfig;

use crate::ops::SourceAttributionCache;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub geo_resolver: Arc<dyn GeoResolver>,
    pub country_directory: Arc<dyn CountryDirectory>,
    pub source_names: Arc<SourceAttributionCache>,
    pub event_sink: Arc<dyn EventSink>,
    pub metrics: Arc<Metrics>,
}
