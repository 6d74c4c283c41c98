use serde::{Deserialize, Serialize};

use super::machine::SelectionChange;
use super::model::SessionStatus;

/// Events published when session data changes, so views can re-render
/// without re-fetching on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionEvent {
    /// An accepted client mutation.
    Changed {
        session_id: String,
        change: SelectionChange,
    },
    /// A limit or lock rejection, surfaced synchronously to the client.
    Rejected {
        session_id: String,
        reason: String,
    },
    /// The selection up to `revision` reached the store.
    Saved { session_id: String, revision: u64 },
    /// A save failed; the session stays dirty until the next tick.
    SaveFailed { session_id: String, error: String },
    /// Status changed (opened, completed, unlocked).
    StatusChanged {
        session_id: String,
        status: SessionStatus,
    },
    /// Operator edited or deleted the session record.
    SessionInvalidated { session_id: String },
}

impl SelectionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SelectionEvent::Changed { session_id, .. }
            | SelectionEvent::Rejected { session_id, .. }
            | SelectionEvent::Saved { session_id, .. }
            | SelectionEvent::SaveFailed { session_id, .. }
            | SelectionEvent::StatusChanged { session_id, .. }
            | SelectionEvent::SessionInvalidated { session_id } => session_id,
        }
    }
}
