//! Client-side selection services.
//!
//! - `cache`: `SessionCache` with explicit invalidation
//! - `event_bus`: `SelectionEventBus` over a tokio broadcast channel
//! - `autosave`: `AutoSaveController` persisting the state machine

mod autosave;
mod cache;
mod event_bus;

pub use autosave::{AutoSaveController, SaveOutcome};
pub use cache::SessionCache;
pub use event_bus::SelectionEventBus;
