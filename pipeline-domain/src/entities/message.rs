// Inbound feed message

use chrono::{DateTime, Utc};

use crate::ports::AckHandle;
use crate::value_objects::MessageId;

pub struct InboundMessage {
    pub id: MessageId,
    pub delivered_at: Option<DateTime<Utc>>,
    pub content_encoding: Option<String>,
    pub data: Vec<u8>,
    pub ack: Box<dyn AckHandle>,
}

impl std::fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundMessage")
            .field("id", &self.id)
            .field("delivered_at", &self.delivered_at)
            .field("content_encoding", &self.content_encoding)
            .field("data_len", &self.data.len())
            .finish_non_exhaustive()
    }
}
