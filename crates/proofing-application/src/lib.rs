//! Application layer for Proofing.
//!
//! This crate provides the use cases that coordinate the selection domain
//! with persistence, file listing, and notification delivery.

pub mod gallery_loader;
pub mod operator_usecase;
pub mod outbox_worker;
pub mod selection;
pub mod selection_usecase;

#[cfg(test)]
mod test_support;

pub use gallery_loader::GalleryLoader;
pub use operator_usecase::OperatorUseCase;
pub use outbox_worker::{DrainReport, OutboxWorker};
pub use selection::{AutoSaveController, SaveOutcome, SelectionEventBus, SessionCache};
pub use selection_usecase::{CompletionOutcome, SelectionUseCase};
