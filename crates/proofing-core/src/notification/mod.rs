//! Completion notification module.
//!
//! Completing a selection records a durable outbox event. A worker outside
//! the selection flow turns pending events into notifications through a
//! [`NotificationDispatcher`], so delivery problems never affect the
//! completed selection.

mod dispatcher;
mod model;
mod outbox;

pub use dispatcher::NotificationDispatcher;
pub use model::{CompletionNotice, ExtraTally, OutboxEvent, OutboxEventKind, OutboxStatus};
pub use outbox::OutboxRepository;
