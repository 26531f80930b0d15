use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Metrics {
    messages_received: AtomicU64,
    messages_acknowledged: AtomicU64,
    parse_failures: AtomicU64,
    sink_failures: AtomicU64,
    ack_failures: AtomicU64,
    attribution_lookups: AtomicU64,
    attribution_fetches: AtomicU64,
    attribution_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_acknowledged: u64,
    pub parse_failures: u64,
    pub sink_failures: u64,
    pub ack_failures: u64,
    pub attribution_lookups: u64,
    pub attribution_fetches: u64,
    pub attribution_failures: u64,
}

impl Metrics {
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acknowledged(&self) {
        self.messages_acknowledged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ack_failure(&self) {
        self.ack_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attribution_lookup(&self) {
        self.attribution_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attribution_fetch(&self) {
        self.attribution_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attribution_failure(&self) {
        self.attribution_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_acknowledged(&self) -> u64 {
        self.messages_acknowledged.load(Ordering::Relaxed)
    }

    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    pub fn parse_failures(&self) -> u64 {
        self.parse_failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_acknowledged: self.messages_acknowledged.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
            attribution_lookups: self.attribution_lookups.load(Ordering::Relaxed),
            attribution_fetches: self.attribution_fetches.load(Ordering::Relaxed),
            attribution_failures: self.attribution_failures.load(Ordering::Relaxed),
        }
    }

    pub fn render_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            ("messages_received", snapshot.messages_received),
            ("messages_acknowledged", snapshot.messages_acknowledged),
            ("parse_failures", snapshot.parse_failures),
            ("sink_failures", snapshot.sink_failures),
            ("ack_failures", snapshot.ack_failures),
            ("attribution_lookups", snapshot.attribution_lookups),
            ("attribution_fetches", snapshot.attribution_fetches),
            ("attribution_failures", snapshot.attribution_failures),
        ];
        let mut out = String::new();
        for (name, value) in counters {
            out.push_str(&format!(
                "# TYPE glyphtrace_{name}_total counter\nglyphtrace_{name}_total {value}\n"
            ));
        }
        out
    }
}
