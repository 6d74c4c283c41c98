//! Consent gate captured right before completion.

use serde::{Deserialize, Serialize};

/// The client's acknowledgment of the studio's terms, captured immediately
/// before the selection is locked. How the consent text is sourced is up to
/// the caller; the state machine only checks the bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentAffirmation {
    affirmed: bool,
}

impl ConsentAffirmation {
    /// The client ticked the acknowledgment.
    pub fn affirmed() -> Self {
        Self { affirmed: true }
    }

    /// The client did not tick the acknowledgment.
    pub fn declined() -> Self {
        Self { affirmed: false }
    }

    pub fn is_affirmed(&self) -> bool {
        self.affirmed
    }
}

impl From<bool> for ConsentAffirmation {
    fn from(affirmed: bool) -> Self {
        Self { affirmed }
    }
}
