// Port fakes shared by the application tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use pipeline_domain::ports::{
    AckHandle, CountryDirectory, EventSink, GeoResolver, MessageFeed, SourceNameFetcher,
};
use pipeline_domain::{
    GeoInfo, InboundMessage, MessageId, ProcessedEvent, RuntimeConfig, SinkError,
};

use crate::ops::SourceAttributionCache;
use crate::{AppState, Metrics};

pub struct FakeGeo;

impl GeoResolver for FakeGeo {
    fn resolve(&self, ip: &str) -> Option<GeoInfo> {
        match ip {
            "8.8.8.8" => Some(GeoInfo {
                country_code: Some("US".to_string()),
                region: Some("CA".to_string()),
                latitude: Some(37.751),
                longitude: Some(-97.822),
            }),
            "1.1.1.1" => Some(GeoInfo {
                country_code: Some("ZZ".to_string()),
                ..GeoInfo::default()
            }),
            _ => None,
        }
    }
}

pub struct FakeCountries;

impl CountryDirectory for FakeCountries {
    fn country_name(&self, code: &str) -> Option<String> {
        (code == "US").then(|| "United States".to_string())
    }
}

pub struct FakeFetcher {
    name: Option<String>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn named(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: Some(name.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            name: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceNameFetcher for FakeFetcher {
    async fn fetch_name(&self, _url: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.name
            .clone()
            .ok_or_else(|| anyhow::anyhow!("attribution service unavailable"))
    }
}

pub struct RecordingSink {
    reject: bool,
    events: Mutex<Vec<ProcessedEvent>>,
}

impl RecordingSink {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            reject: false,
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            reject: true,
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<ProcessedEvent> {
        self.events.lock().expect("sink lock").clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert_events(&self, events: &[ProcessedEvent]) -> Result<(), SinkError> {
        if self.reject {
            return Err(SinkError::Rejected {
                rejected: events.len(),
                reason: "no such column".to_string(),
            });
        }
        self.events
            .lock()
            .expect("sink lock")
            .extend_from_slice(events);
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records which message ids were acknowledged.
#[derive(Clone, Default)]
pub struct AckLog {
    acked: Arc<Mutex<Vec<String>>>,
}

impl AckLog {
    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().expect("ack lock").clone()
    }

    pub fn message(&self, id: &str, data: &[u8]) -> InboundMessage {
        InboundMessage {
            id: MessageId(id.to_string()),
            delivered_at: None,
            content_encoding: None,
            data: data.to_vec(),
            ack: Box::new(RecordingAck {
                id: id.to_string(),
                log: self.clone(),
            }),
        }
    }
}

struct RecordingAck {
    id: String,
    log: AckLog,
}

#[async_trait]
impl AckHandle for RecordingAck {
    async fn ack(self: Box<Self>) -> anyhow::Result<()> {
        self.log.acked.lock().expect("ack lock").push(self.id);
        Ok(())
    }
}

pub struct QueueFeed {
    items: VecDeque<anyhow::Result<InboundMessage>>,
}

impl QueueFeed {
    pub fn new(items: Vec<anyhow::Result<InboundMessage>>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

#[async_trait]
impl MessageFeed for QueueFeed {
    async fn next_message(&mut self) -> Option<anyhow::Result<InboundMessage>> {
        self.items.pop_front()
    }
}

pub fn state_with(fetcher: Arc<FakeFetcher>, sink: Arc<RecordingSink>) -> AppState {
    let metrics = Arc::new(Metrics::default());
    AppState {
        config: RuntimeConfig::default(),
        geo_resolver: Arc::new(FakeGeo),
        country_directory: Arc::new(FakeCountries),
        source_names: Arc::new(SourceAttributionCache::new(
            fetcher,
            Duration::from_secs(1),
            metrics.clone(),
        )),
        event_sink: sink,
        metrics,
    }
}
