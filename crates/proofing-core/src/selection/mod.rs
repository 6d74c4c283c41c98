//! Selection domain module.
//!
//! This module contains the selection session model, the client-side state
//! machine that enforces package limits, and the repository interface.
//!
//! # Module Structure
//!
//! - `model`: `SelectionSession`, `SelectionSettings`, `SelectedPhoto`, `SessionStatus`
//! - `validation`: limit counters, `Rejection`, completion mismatches
//! - `machine`: `SelectionStateMachine`
//! - `consent`: `ConsentAffirmation`
//! - `event`: `SelectionEvent`
//! - `repository`: `SelectionSessionRepository`

mod consent;
mod event;
mod machine;
mod model;
mod repository;
mod validation;

// Re-export public API
pub use consent::ConsentAffirmation;
pub use event::SelectionEvent;
pub use machine::{CompletionTicket, SaveSnapshot, SelectionChange, SelectionStateMachine};
pub use model::{
    ExtraLimit, SelectedPhoto, SelectionMap, SelectionSession, SelectionSettings, SessionStatus,
};
pub use repository::SelectionSessionRepository;
pub use validation::{
    CompletionMismatch, CompletionReadiness, LimitField, Rejection, check_completion,
    completion_mismatches, extra_count, selected_count,
};
