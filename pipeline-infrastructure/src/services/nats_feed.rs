use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_nats::jetstream::{self, consumer::pull, Message};
use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::info;

use pipeline_domain::ports::{AckHandle, MessageFeed};
use pipeline_domain::{FeedConfig, InboundMessage, MessageId};

use crate::utils::to_chrono_utc;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Durable JetStream pull consumer with explicit acknowledgment.
pub struct NatsFeed {
    messages: pull::Stream,
}

impl NatsFeed {
    pub async fn connect(config: &FeedConfig) -> Result<Self> {
        info!(url = %config.nats_url, "connecting to NATS");
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(CONNECT_TIMEOUT)
            .connect(config.nats_url.as_str())
            .await
            .context("failed to connect to NATS")?;
        let jetstream = jetstream::new(client);

        let stream = jetstream
            .get_stream(&config.stream)
            .await
            .with_context(|| format!("stream '{}' not found", config.stream))?;
        let consumer = stream
            .get_or_create_consumer(
                &config.consumer,
                pull::Config {
                    durable_name: Some(config.consumer.clone()),
                    filter_subject: config.subject.clone(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_seconds),
                    ..Default::default()
                },
            )
            .await
            .context("failed to create consumer")?;
        let messages = consumer
            .messages()
            .await
            .context("failed to open message stream")?;

        info!(
            stream = %config.stream,
            consumer = %config.consumer,
            subject = %config.subject,
            "consumer ready"
        );
        Ok(Self { messages })
    }
}

#[async_trait]
impl MessageFeed for NatsFeed {
    async fn next_message(&mut self) -> Option<Result<InboundMessage>> {
        let delivery = self.messages.next().await?;
        Some(
            delivery
                .map_err(|err| anyhow!("jetstream delivery failed: {}", err))
                .map(into_inbound),
        )
    }
}

fn into_inbound(message: Message) -> InboundMessage {
    let (id, delivered_at) = match message.info() {
        Ok(info) => (
            format!("{}:{}", info.stream, info.stream_sequence),
            to_chrono_utc(info.published),
        ),
        Err(_) => (message.subject.to_string(), None),
    };
    let content_encoding = message
        .headers
        .as_ref()
        .and_then(|headers| headers.get("Content-Encoding"))
        .map(|value| value.as_str().to_string());
    let data = message.payload.to_vec();

    InboundMessage {
        id: MessageId(id),
        delivered_at,
        content_encoding,
        data,
        ack: Box::new(NatsAck { message }),
    }
}

struct NatsAck {
    message: Message,
}

#[async_trait]
impl AckHandle for NatsAck {
    async fn ack(self: Box<Self>) -> Result<()> {
        self.message
            .ack()
            .await
            .map_err(|err| anyhow!("jetstream ack failed: {}", err))
    }
}
