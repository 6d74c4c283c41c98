//! OutboxEvent DTOs and migrations

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use proofing_core::notification::{
    CompletionNotice, ExtraTally, OutboxEvent, OutboxEventKind, OutboxStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraTallyDTO {
    pub extra_id: String,
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNoticeDTO {
    pub session_id: String,
    pub project_id: String,
    pub selected_count: u32,
    pub total_limit: u32,
    #[serde(default)]
    pub extras: Vec<ExtraTallyDTO>,
    #[serde(default)]
    pub commented_photos: Vec<String>,
    pub completed_at: String,
}

/// Outbox event V1.0.0 (initial version).
///
/// `kind` and `status` are stored as snake_case strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct OutboxEventV1_0_0 {
    pub id: String,
    pub kind: String,
    pub notice: CompletionNoticeDTO,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn default_status() -> String {
    OutboxStatus::Pending.to_string()
}

impl IntoDomain<OutboxEvent> for OutboxEventV1_0_0 {
    fn into_domain(self) -> OutboxEvent {
        let kind = self.kind.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown outbox event kind '{}', assuming selection_completed", self.kind);
            OutboxEventKind::SelectionCompleted
        });
        let status = self.status.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown outbox status '{}', treating as pending", self.status);
            OutboxStatus::Pending
        });

        OutboxEvent {
            id: self.id,
            kind,
            notice: CompletionNotice {
                session_id: self.notice.session_id,
                project_id: self.notice.project_id,
                selected_count: self.notice.selected_count,
                total_limit: self.notice.total_limit,
                extras: self
                    .notice
                    .extras
                    .into_iter()
                    .map(|t| ExtraTally {
                        extra_id: t.extra_id,
                        label: t.label,
                        count: t.count,
                    })
                    .collect(),
                commented_photos: self.notice.commented_photos,
                completed_at: self.notice.completed_at,
            },
            status,
            attempts: self.attempts,
            last_error: self.last_error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl FromDomain<OutboxEvent> for OutboxEventV1_0_0 {
    fn from_domain(event: OutboxEvent) -> Self {
        OutboxEventV1_0_0 {
            id: event.id,
            kind: event.kind.to_string(),
            notice: CompletionNoticeDTO {
                session_id: event.notice.session_id,
                project_id: event.notice.project_id,
                selected_count: event.notice.selected_count,
                total_limit: event.notice.total_limit,
                extras: event
                    .notice
                    .extras
                    .into_iter()
                    .map(|t| ExtraTallyDTO {
                        extra_id: t.extra_id,
                        label: t.label,
                        count: t.count,
                    })
                    .collect(),
                commented_photos: event.notice.commented_photos,
                completed_at: event.notice.completed_at,
            },
            status: event.status.to_string(),
            attempts: event.attempts,
            last_error: event.last_error,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Creates and configures a Migrator instance for OutboxEvent entities.
pub fn create_outbox_event_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let event_path = version_migrate::Migrator::define("outbox_event")
        .from::<OutboxEventV1_0_0>()
        .into_with_save::<OutboxEvent>();

    migrator
        .register(event_path)
        .expect("Failed to register outbox_event migration path");

    migrator
}
