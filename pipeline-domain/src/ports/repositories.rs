use async_trait::async_trait;

use crate::entities::ProcessedEvent;
use crate::error::SinkError;

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn insert_events(&self, events: &[ProcessedEvent]) -> Result<(), SinkError>;
    async fn ping(&self) -> anyhow::Result<()>;
}
