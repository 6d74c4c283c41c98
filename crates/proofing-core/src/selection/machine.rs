//! Client-side selection state machine.
//!
//! Holds the authoritative in-memory selection map while a client is
//! selecting, enforces the total and per-extra limits at mutation time, and
//! owns the `selecting -> completed` transition. Persistence is driven from
//! outside through [`SelectionStateMachine::snapshot`] and
//! [`SelectionStateMachine::mark_saved`].

use serde::{Deserialize, Serialize};

use super::consent::ConsentAffirmation;
use super::model::{
    SelectedPhoto, SelectionMap, SelectionSession, SelectionSettings, SessionStatus,
};
use super::validation::{self, CompletionReadiness, Rejection};
use crate::error::{ProofingError, Result};

/// An accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionChange {
    Selected { photo_id: String },
    Deselected { photo_id: String },
    ExtraSet { photo_id: String, extra_id: String },
    ExtraCleared { photo_id: String, extra_id: String },
    CommentUpdated { photo_id: String },
}

impl SelectionChange {
    pub fn photo_id(&self) -> &str {
        match self {
            SelectionChange::Selected { photo_id }
            | SelectionChange::Deselected { photo_id }
            | SelectionChange::ExtraSet { photo_id, .. }
            | SelectionChange::ExtraCleared { photo_id, .. }
            | SelectionChange::CommentUpdated { photo_id } => photo_id,
        }
    }
}

/// Payload handed to the store by the auto-save controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSnapshot {
    pub session_id: String,
    pub revision: u64,
    pub entries: Vec<SelectedPhoto>,
    pub status: SessionStatus,
}

/// Proof that `complete` locked the selection, used to roll the lock back if
/// the forced save fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionTicket {
    previous_status: SessionStatus,
    pub revision: u64,
}

/// In-memory view of one session's selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStateMachine {
    session_id: String,
    settings: SelectionSettings,
    status: SessionStatus,
    selection: SelectionMap,
    revision: u64,
    saved_revision: u64,
}

impl SelectionStateMachine {
    /// Creates a machine from already-loaded parts. The initial state counts
    /// as saved.
    pub fn new(
        session_id: impl Into<String>,
        settings: SelectionSettings,
        status: SessionStatus,
        selection: SelectionMap,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            settings,
            status,
            selection,
            revision: 0,
            saved_revision: 0,
        }
    }

    /// Creates a machine from a stored session.
    pub fn from_session(session: &SelectionSession) -> Self {
        Self::new(
            session.id.clone(),
            session.settings.clone(),
            session.status,
            session.selection_data.clone(),
        )
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn settings(&self) -> &SelectionSettings {
        &self.settings
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn selection(&self) -> &SelectionMap {
        &self.selection
    }

    pub fn photo(&self, photo_id: &str) -> Option<&SelectedPhoto> {
        self.selection.get(photo_id)
    }

    pub fn is_selected(&self, photo_id: &str) -> bool {
        self.photo(photo_id).is_some_and(|p| p.selected)
    }

    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when there are accepted mutations not yet confirmed as saved.
    pub fn is_dirty(&self) -> bool {
        self.revision > self.saved_revision
    }

    pub fn selected_count(&self) -> u32 {
        validation::selected_count(&self.selection)
    }

    pub fn extra_count(&self, extra_id: &str) -> u32 {
        validation::extra_count(&self.selection, extra_id)
    }

    /// Selects or deselects a photo.
    ///
    /// Selecting is refused when the selected count already equals the total
    /// limit. Deselecting always succeeds and leaves the photo's extras and
    /// comment in place; those flags stay inert until the photo is selected
    /// again. On reselection a kept flag whose extra is already full on other
    /// photos is cleared.
    pub fn toggle_select(&mut self, photo_id: &str) -> std::result::Result<SelectionChange, Rejection> {
        self.ensure_unlocked()?;

        if self.is_selected(photo_id) {
            self.entry(photo_id).selected = false;
            self.touch();
            return Ok(SelectionChange::Deselected {
                photo_id: photo_id.to_string(),
            });
        }

        validation::check_total_capacity(&self.selection, &self.settings)?;
        let overflowing: Vec<String> = match self.photo(photo_id) {
            Some(photo) => self
                .settings
                .extra_limits
                .iter()
                .filter(|extra| photo.has_extra(&extra.id))
                .filter(|extra| validation::check_extra_capacity(&self.selection, extra).is_err())
                .map(|extra| extra.id.clone())
                .collect(),
            None => Vec::new(),
        };
        let entry = self.entry(photo_id);
        entry.selected = true;
        for extra_id in overflowing {
            entry.extra_selections.insert(extra_id, false);
        }
        self.touch();
        Ok(SelectionChange::Selected {
            photo_id: photo_id.to_string(),
        })
    }

    /// Sets or clears an extra flag on a selected photo.
    ///
    /// Setting is refused when the number of selected photos carrying the
    /// flag already equals the extra's limit. Clearing always succeeds.
    pub fn toggle_extra(
        &mut self,
        photo_id: &str,
        extra_id: &str,
    ) -> std::result::Result<SelectionChange, Rejection> {
        self.ensure_unlocked()?;

        if !self.is_selected(photo_id) {
            return Err(Rejection::NotSelected {
                photo_id: photo_id.to_string(),
            });
        }
        let extra = self
            .settings
            .find_extra(extra_id)
            .cloned()
            .ok_or_else(|| Rejection::UnknownExtra {
                extra_id: extra_id.to_string(),
            })?;

        let currently_set = self.photo(photo_id).is_some_and(|p| p.has_extra(extra_id));
        if currently_set {
            self.entry(photo_id)
                .extra_selections
                .insert(extra_id.to_string(), false);
            self.touch();
            return Ok(SelectionChange::ExtraCleared {
                photo_id: photo_id.to_string(),
                extra_id: extra_id.to_string(),
            });
        }

        validation::check_extra_capacity(&self.selection, &extra)?;
        self.entry(photo_id)
            .extra_selections
            .insert(extra_id.to_string(), true);
        self.touch();
        Ok(SelectionChange::ExtraSet {
            photo_id: photo_id.to_string(),
            extra_id: extra_id.to_string(),
        })
    }

    /// Overwrites the comment of a photo, creating its entry if absent.
    pub fn update_comment(
        &mut self,
        photo_id: &str,
        text: impl Into<String>,
    ) -> std::result::Result<SelectionChange, Rejection> {
        self.ensure_unlocked()?;
        self.entry(photo_id).comment = text.into();
        self.touch();
        Ok(SelectionChange::CommentUpdated {
            photo_id: photo_id.to_string(),
        })
    }

    /// Compares every counter with its configured size. Exact equality is
    /// required; under- and over-selection are both reported.
    pub fn validate_for_completion(&self) -> CompletionReadiness {
        validation::check_completion(&self.selection, &self.settings)
    }

    /// Locks the selection.
    ///
    /// The caller must persist the returned revision immediately and call
    /// [`Self::rollback_completion`] if that save fails.
    ///
    /// # Errors
    ///
    /// - `Rejected(Locked)` if already completed
    /// - `CompletionNotReady` if any counter is off
    /// - `ConsentRequired` if the consent bit is not set
    pub fn complete(&mut self, consent: ConsentAffirmation) -> Result<CompletionTicket> {
        self.ensure_unlocked()?;

        if let CompletionReadiness::NotReady(mismatches) = self.validate_for_completion() {
            return Err(ProofingError::CompletionNotReady(mismatches));
        }
        if !consent.is_affirmed() {
            return Err(ProofingError::ConsentRequired);
        }

        let previous_status = self.status;
        self.status = SessionStatus::Completed;
        self.revision += 1;
        Ok(CompletionTicket {
            previous_status,
            revision: self.revision,
        })
    }

    /// Reverts a completion whose save did not go through.
    pub fn rollback_completion(&mut self, ticket: CompletionTicket) {
        if self.status == SessionStatus::Completed {
            self.status = ticket.previous_status;
            self.revision += 1;
        }
    }

    /// Records that the client opened the session (`Waiting -> Viewed`).
    ///
    /// Returns true if the status changed.
    pub fn mark_viewed(&mut self) -> bool {
        if self.status == SessionStatus::Waiting {
            self.status = SessionStatus::Viewed;
            self.revision += 1;
            return true;
        }
        false
    }

    /// Captures the current state for persistence.
    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot {
            session_id: self.session_id.clone(),
            revision: self.revision,
            entries: self.selection.values().cloned().collect(),
            status: self.status,
        }
    }

    /// Records that everything up to `revision` reached the store.
    pub fn mark_saved(&mut self, revision: u64) {
        if revision > self.saved_revision {
            self.saved_revision = revision;
        }
    }

    fn ensure_unlocked(&self) -> std::result::Result<(), Rejection> {
        if self.is_locked() {
            return Err(Rejection::Locked);
        }
        Ok(())
    }

    fn entry(&mut self, photo_id: &str) -> &mut SelectedPhoto {
        self.selection
            .entry(photo_id.to_string())
            .or_insert_with(|| SelectedPhoto::new(photo_id))
    }

    /// Bumps the revision after an accepted client mutation and moves an
    /// untouched session into `Selecting`.
    fn touch(&mut self) {
        if matches!(self.status, SessionStatus::Waiting | SessionStatus::Viewed) {
            self.status = SessionStatus::Selecting;
        }
        self.revision += 1;
    }
}

#[cfg(test)]
#[path = "machine_test.rs"]
mod tests;
