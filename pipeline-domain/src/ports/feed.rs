use async_trait::async_trait;

use crate::entities::InboundMessage;

/// Positive acknowledgment of one delivered message.
///
/// Consuming `self` makes a second acknowledgment of the same delivery
/// impossible.
#[async_trait]
pub trait AckHandle: Send {
    async fn ack(self: Box<Self>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait MessageFeed: Send {
    /// `None` once the feed is closed.
    async fn next_message(&mut self) -> Option<anyhow::Result<InboundMessage>>;
}
