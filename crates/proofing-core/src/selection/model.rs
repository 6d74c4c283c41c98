//! Selection session domain model.
//!
//! A `SelectionSession` is one client's photo-selection task for one project:
//! the folder of candidate photos, the package limits sold to the client, and
//! the per-photo selection map the client edits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ProofingError, Result};

/// Lifecycle status of a selection session.
///
/// Sessions move forward under normal operation; the only backwards edge is
/// the operator's unlock (`Completed -> Selecting`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// Created by the operator, link not yet opened.
    #[default]
    Waiting,
    /// The client opened the link.
    Viewed,
    /// The client has started selecting.
    Selecting,
    /// The client confirmed; the selection is locked.
    Completed,
}

impl SessionStatus {
    /// Returns true when client mutations must be refused.
    pub fn is_locked(self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

/// A named sub-quota (e.g. "album cover") marked on already-selected photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraLimit {
    /// Stable identifier used as key in `SelectedPhoto::extra_selections`.
    pub id: String,
    /// Label shown to the client.
    pub label: String,
    /// Exact number of photos that must carry this extra. Always >= 1.
    pub limit: u32,
}

/// Package settings of a session. Operator-owned; read-only for the client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionSettings {
    /// Exact number of photos the client must select.
    pub total_limit: u32,
    /// Additional named sub-quotas.
    #[serde(default)]
    pub extra_limits: Vec<ExtraLimit>,
    /// Last day on which the client may open the session.
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

impl SelectionSettings {
    /// Creates settings with only a total limit.
    pub fn with_total(total_limit: u32) -> Self {
        Self {
            total_limit,
            ..Default::default()
        }
    }

    /// Adds an extra limit (builder style).
    pub fn extra(mut self, id: impl Into<String>, label: impl Into<String>, limit: u32) -> Self {
        self.extra_limits.push(ExtraLimit {
            id: id.into(),
            label: label.into(),
            limit,
        });
        self
    }

    /// Looks up an extra limit by id.
    pub fn find_extra(&self, extra_id: &str) -> Option<&ExtraLimit> {
        self.extra_limits.iter().find(|e| e.id == extra_id)
    }

    /// Checks operator-supplied settings before they are stored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if an extra id is empty or duplicated, or if an
    /// extra limit is zero.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for extra in &self.extra_limits {
            if extra.id.trim().is_empty() {
                return Err(ProofingError::invalid_input("extra limit id must not be empty"));
            }
            if extra.limit == 0 {
                return Err(ProofingError::invalid_input(format!(
                    "extra limit '{}' must be at least 1",
                    extra.id
                )));
            }
            if !seen.insert(extra.id.as_str()) {
                return Err(ProofingError::invalid_input(format!(
                    "duplicate extra limit id '{}'",
                    extra.id
                )));
            }
        }
        Ok(())
    }

    /// Returns true if the session can no longer be opened on `today`.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|date| today > date)
    }
}

/// Selection state of one photo that has been touched at least once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectedPhoto {
    /// Candidate photo id from the file listing provider.
    pub id: String,
    /// Whether the photo counts toward the total limit.
    pub selected: bool,
    /// Extra-limit id -> flag. Flags survive deselection.
    #[serde(default)]
    pub extra_selections: BTreeMap<String, bool>,
    /// Free-text client comment.
    #[serde(default)]
    pub comment: String,
    /// Operator-only annotation, ignored by every limit.
    #[serde(default)]
    pub is_starred: bool,
}

impl SelectedPhoto {
    /// Creates an untouched entry for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Returns the flag for `extra_id` (false when absent).
    pub fn has_extra(&self, extra_id: &str) -> bool {
        self.extra_selections.get(extra_id).copied().unwrap_or(false)
    }
}

/// Per-photo selection map keyed by photo id.
pub type SelectionMap = BTreeMap<String, SelectedPhoto>;

/// One client's photo-selection task for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSession {
    /// Server-assigned identifier, immutable.
    pub id: String,
    /// Owning project, immutable after creation.
    pub project_id: String,
    /// Location of the candidate photos in external file storage.
    pub folder_reference: String,
    /// The only client credential. Regeneration invalidates old links.
    pub access_token: String,
    /// Package limits.
    pub settings: SelectionSettings,
    /// Selection entries keyed by photo id.
    pub selection_data: SelectionMap,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
}

impl SelectionSession {
    /// Creates a new session in `Waiting` status with an empty selection.
    pub fn new(
        project_id: impl Into<String>,
        folder_reference: impl Into<String>,
        access_token: impl Into<String>,
        settings: SelectionSettings,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            folder_reference: folder_reference.into(),
            access_token: access_token.into(),
            settings,
            selection_data: SelectionMap::new(),
            status: SessionStatus::Waiting,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Returns the selection entries as a list, ordered by photo id.
    pub fn selection_list(&self) -> Vec<SelectedPhoto> {
        self.selection_data.values().cloned().collect()
    }

    /// Replaces the selection map from a list of entries.
    pub fn replace_selection(&mut self, entries: impl IntoIterator<Item = SelectedPhoto>) {
        self.selection_data = entries.into_iter().map(|p| (p.id.clone(), p)).collect();
    }

    /// Operator unlock: `Completed -> Selecting`, selection kept as is.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless the session is completed.
    pub fn unlock(&mut self) -> Result<()> {
        if self.status != SessionStatus::Completed {
            return Err(ProofingError::invalid_input(format!(
                "session '{}' is {}, only completed sessions can be unlocked",
                self.id, self.status
            )));
        }
        self.status = SessionStatus::Selecting;
        Ok(())
    }

    /// Sets the operator star on a photo, creating its entry if absent.
    /// Stars never count toward any limit.
    pub fn set_starred(&mut self, photo_id: &str, starred: bool) {
        self.selection_data
            .entry(photo_id.to_string())
            .or_insert_with(|| SelectedPhoto::new(photo_id))
            .is_starred = starred;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_settings_validate_rejects_zero_extra() {
        let settings = SelectionSettings::with_total(10).extra("cover", "Album cover", 0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_validate_rejects_duplicate_extra() {
        let settings = SelectionSettings::with_total(10)
            .extra("cover", "Album cover", 1)
            .extra("cover", "Poster", 2);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_validate_accepts_zero_total() {
        let settings = SelectionSettings::with_total(0).extra("poster", "Poster", 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_expiration_is_inclusive_of_last_day() {
        let mut settings = SelectionSettings::with_total(1);
        settings.expiration_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert!(!settings.is_expired_on(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        assert!(settings.is_expired_on(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()));
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(SessionStatus::Completed.to_string(), "completed");
        assert_eq!(
            SessionStatus::from_str("selecting").unwrap(),
            SessionStatus::Selecting
        );
        assert!(SessionStatus::Completed.is_locked());
        assert!(!SessionStatus::Viewed.is_locked());
    }

    #[test]
    fn test_new_session_starts_waiting() {
        let session = SelectionSession::new("p1", "folder", "TOKEN", SelectionSettings::with_total(3));
        assert_eq!(session.status, SessionStatus::Waiting);
        assert!(session.selection_data.is_empty());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_unlock_only_from_completed_and_keeps_selection() {
        let mut session = SelectionSession::new("p1", "folder", "TOKEN", SelectionSettings::with_total(1));
        assert!(session.unlock().is_err());

        let mut photo = SelectedPhoto::new("A");
        photo.selected = true;
        session.replace_selection([photo]);
        session.status = SessionStatus::Completed;

        session.unlock().unwrap();

        assert_eq!(session.status, SessionStatus::Selecting);
        assert!(session.selection_data["A"].selected);
    }

    #[test]
    fn test_set_starred_does_not_select() {
        let mut session = SelectionSession::new("p1", "folder", "TOKEN", SelectionSettings::with_total(1));
        session.set_starred("B", true);

        let photo = &session.selection_data["B"];
        assert!(photo.is_starred);
        assert!(!photo.selected);
    }
}
