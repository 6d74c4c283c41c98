use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::selection::{SelectionSession, extra_count, selected_count};

/// Per-extra count included in a completion notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraTally {
    pub extra_id: String,
    pub label: String,
    pub count: u32,
}

/// What the studio is told when a client completes a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub session_id: String,
    pub project_id: String,
    pub selected_count: u32,
    pub total_limit: u32,
    #[serde(default)]
    pub extras: Vec<ExtraTally>,
    /// Photo ids that carry a non-empty comment.
    #[serde(default)]
    pub commented_photos: Vec<String>,
    pub completed_at: String,
}

impl CompletionNotice {
    /// Summarizes a completed session.
    pub fn from_session(session: &SelectionSession) -> Self {
        let extras = session
            .settings
            .extra_limits
            .iter()
            .map(|extra| ExtraTally {
                extra_id: extra.id.clone(),
                label: extra.label.clone(),
                count: extra_count(&session.selection_data, &extra.id),
            })
            .collect();
        let commented_photos = session
            .selection_data
            .values()
            .filter(|p| !p.comment.trim().is_empty())
            .map(|p| p.id.clone())
            .collect();

        Self {
            session_id: session.id.clone(),
            project_id: session.project_id.clone(),
            selected_count: selected_count(&session.selection_data),
            total_limit: session.settings.total_limit,
            extras,
            commented_photos,
            completed_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Kind of outbox event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutboxEventKind {
    SelectionCompleted,
}

/// Delivery state of an outbox event.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutboxStatus {
    #[default]
    Pending,
    Delivered,
    /// Gave up after the configured number of attempts.
    Failed,
}

/// A durable record of something that must be delivered once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: String,
    pub kind: OutboxEventKind,
    pub notice: CompletionNotice,
    #[serde(default)]
    pub status: OutboxStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl OutboxEvent {
    pub fn selection_completed(notice: CompletionNotice) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: OutboxEventKind::SelectionCompleted,
            notice,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OutboxStatus::Pending
    }

    pub fn mark_delivered(&mut self) {
        self.status = OutboxStatus::Delivered;
        self.last_error = None;
        self.updated_at = Utc::now().to_rfc3339();
    }

    /// Counts a failed attempt and gives up once `max_attempts` is reached.
    pub fn record_failure(&mut self, error: impl Into<String>, max_attempts: u32) -> OutboxStatus {
        self.attempts += 1;
        self.last_error = Some(error.into());
        if self.attempts >= max_attempts {
            self.status = OutboxStatus::Failed;
        }
        self.updated_at = Utc::now().to_rfc3339();
        self.status
    }
}
