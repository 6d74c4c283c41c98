use async_trait::async_trait;

use super::model::CompletionNotice;
use crate::error::Result;

/// Delivers completion notices to the studio (email, chat, ...).
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Sends one notice.
    ///
    /// # Errors
    ///
    /// Returns `Notification` when delivery failed and may be retried.
    async fn send_completion(&self, notice: &CompletionNotice) -> Result<()>;
}
