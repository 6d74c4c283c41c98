//! SelectionSession DTOs and migrations
//!
//! - V1.0.0: Initial schema (total/extra limits, selection entries, status)
//! - V1.1.0: Added `expiration_date` on the session and `is_starred` on entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use proofing_core::selection::{
    ExtraLimit, SelectedPhoto, SelectionSession, SelectionSettings, SessionStatus,
};

// ============================================================================
// Nested DTOs (Anti-Corruption Layer)
// ============================================================================

/// Persisted session status. Kept separate from the domain enum so renames in
/// the domain do not break stored files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatusDTO {
    #[default]
    Waiting,
    Viewed,
    Selecting,
    Completed,
}

impl From<SessionStatusDTO> for SessionStatus {
    fn from(status: SessionStatusDTO) -> Self {
        match status {
            SessionStatusDTO::Waiting => SessionStatus::Waiting,
            SessionStatusDTO::Viewed => SessionStatus::Viewed,
            SessionStatusDTO::Selecting => SessionStatus::Selecting,
            SessionStatusDTO::Completed => SessionStatus::Completed,
        }
    }
}

impl From<SessionStatus> for SessionStatusDTO {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Waiting => SessionStatusDTO::Waiting,
            SessionStatus::Viewed => SessionStatusDTO::Viewed,
            SessionStatus::Selecting => SessionStatusDTO::Selecting,
            SessionStatus::Completed => SessionStatusDTO::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraLimitDTO {
    pub id: String,
    pub label: String,
    pub limit: u32,
}

/// Selection entry as stored in V1.0.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPhotoV1_0_0 {
    pub id: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub extra_selections: BTreeMap<String, bool>,
    #[serde(default)]
    pub comment: String,
}

/// Selection entry as stored in V1.1.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPhotoV1_1_0 {
    pub id: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub extra_selections: BTreeMap<String, bool>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_starred: bool,
}

// ============================================================================
// SelectionSession DTOs
// ============================================================================

/// Represents V1.0.0 of the selection session schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct SelectionSessionV1_0_0 {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub folder_reference: String,
    pub access_token: String,
    pub total_limit: u32,
    #[serde(default)]
    pub extra_limits: Vec<ExtraLimitDTO>,
    #[serde(default)]
    pub status: SessionStatusDTO,
    #[serde(default, rename = "selection")]
    pub selection_data: Vec<SelectedPhotoV1_0_0>,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
}

/// Represents V1.1.0 of the selection session schema.
/// Added `expiration_date` and per-entry `is_starred`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
pub struct SelectionSessionV1_1_0 {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub folder_reference: String,
    pub access_token: String,
    pub total_limit: u32,
    #[serde(default)]
    pub extra_limits: Vec<ExtraLimitDTO>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: SessionStatusDTO,
    #[serde(default, rename = "selection")]
    pub selection_data: Vec<SelectedPhotoV1_1_0>,
    pub created_at: String,
    pub updated_at: String,
}

/// Type alias for the latest SelectionSession version.
pub type SelectionSessionDTO = SelectionSessionV1_1_0;

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from SelectionSessionV1_0_0 to SelectionSessionV1_1_0.
/// Sessions never expire and no entry is starred by default.
impl MigratesTo<SelectionSessionV1_1_0> for SelectionSessionV1_0_0 {
    fn migrate(self) -> SelectionSessionV1_1_0 {
        SelectionSessionV1_1_0 {
            id: self.id,
            project_id: self.project_id,
            folder_reference: self.folder_reference,
            access_token: self.access_token,
            total_limit: self.total_limit,
            extra_limits: self.extra_limits,
            expiration_date: None,
            status: self.status,
            selection_data: self
                .selection_data
                .into_iter()
                .map(|entry| SelectedPhotoV1_1_0 {
                    id: entry.id,
                    selected: entry.selected,
                    extra_selections: entry.extra_selections,
                    comment: entry.comment,
                    is_starred: false,
                })
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl IntoDomain<SelectionSession> for SelectionSessionV1_1_0 {
    fn into_domain(self) -> SelectionSession {
        let settings = SelectionSettings {
            total_limit: self.total_limit,
            extra_limits: self
                .extra_limits
                .into_iter()
                .map(|e| ExtraLimit {
                    id: e.id,
                    label: e.label,
                    limit: e.limit,
                })
                .collect(),
            expiration_date: self.expiration_date,
        };

        let mut session = SelectionSession {
            id: self.id,
            project_id: self.project_id,
            folder_reference: self.folder_reference,
            access_token: self.access_token,
            settings,
            selection_data: Default::default(),
            status: self.status.into(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        session.replace_selection(self.selection_data.into_iter().map(|entry| SelectedPhoto {
            id: entry.id,
            selected: entry.selected,
            extra_selections: entry.extra_selections,
            comment: entry.comment,
            is_starred: entry.is_starred,
        }));
        session
    }
}

impl FromDomain<SelectionSession> for SelectionSessionV1_1_0 {
    fn from_domain(session: SelectionSession) -> Self {
        SelectionSessionV1_1_0 {
            id: session.id,
            project_id: session.project_id,
            folder_reference: session.folder_reference,
            access_token: session.access_token,
            total_limit: session.settings.total_limit,
            extra_limits: session
                .settings
                .extra_limits
                .into_iter()
                .map(|e| ExtraLimitDTO {
                    id: e.id,
                    label: e.label,
                    limit: e.limit,
                })
                .collect(),
            expiration_date: session.settings.expiration_date,
            status: session.status.into(),
            selection_data: session
                .selection_data
                .into_values()
                .map(|p| SelectedPhotoV1_1_0 {
                    id: p.id,
                    selected: p.selected,
                    extra_selections: p.extra_selections,
                    comment: p.comment,
                    is_starred: p.is_starred,
                })
                .collect(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for SelectionSession entities.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Adds `expiration_date` (None) and `is_starred` (false)
/// - V1.1.0 → SelectionSession: Converts DTO to domain model
pub fn create_selection_session_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let session_path = version_migrate::Migrator::define("selection_session")
        .from::<SelectionSessionV1_0_0>()
        .step::<SelectionSessionV1_1_0>()
        .into_with_save::<SelectionSession>();

    migrator
        .register(session_path)
        .expect("Failed to register selection_session migration path");

    migrator
}
