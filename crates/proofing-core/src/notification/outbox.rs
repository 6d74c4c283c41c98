//! Outbox repository trait.

use async_trait::async_trait;

use super::model::{OutboxEvent, OutboxStatus};
use crate::error::Result;

/// Durable store of events waiting to be delivered.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Persists a new event. Must be durable before returning.
    async fn enqueue(&self, event: &OutboxEvent) -> Result<()>;

    /// Lists events still waiting for delivery, oldest first.
    async fn pending(&self) -> Result<Vec<OutboxEvent>>;

    /// Marks an event as delivered.
    async fn mark_delivered(&self, event_id: &str) -> Result<()>;

    /// Records a failed delivery attempt.
    ///
    /// # Returns
    ///
    /// The event's status after the attempt: `Pending` while retries remain,
    /// `Failed` once `max_attempts` is reached.
    async fn record_failure(
        &self,
        event_id: &str,
        error: &str,
        max_attempts: u32,
    ) -> Result<OutboxStatus>;
}
