//! TOML-based OutboxRepository implementation.
//!
//! Stores each event as `<outbox_dir>/<event_id>.toml`. Delivered and failed
//! events stay on disk as an audit trail; only `pending` events are returned
//! to the worker.

use async_trait::async_trait;
use proofing_core::error::{ProofingError, Result};
use proofing_core::notification::{OutboxEvent, OutboxRepository, OutboxStatus};
use std::path::{Path, PathBuf};
use tokio::task;

use crate::dto::create_outbox_event_migrator;
use crate::storage::{VersionedTomlFile, list_toml_files};

const ENTITY: &str = "outbox_event";

#[derive(Debug, Clone)]
pub struct TomlOutboxRepository {
    outbox_dir: PathBuf,
}

impl TomlOutboxRepository {
    pub fn new(outbox_dir: impl AsRef<Path>) -> Result<Self> {
        let outbox_dir = outbox_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&outbox_dir).map_err(|e| {
            ProofingError::io(format!(
                "Failed to create outbox directory '{}': {}",
                outbox_dir.display(),
                e
            ))
        })?;
        Ok(Self { outbox_dir })
    }

    fn event_path(&self, event_id: &str) -> PathBuf {
        self.outbox_dir.join(format!("{}.toml", event_id))
    }

    /// All stored events regardless of status, oldest first.
    pub async fn list_all(&self) -> Result<Vec<OutboxEvent>> {
        let dir = self.outbox_dir.clone();

        task::spawn_blocking(move || {
            let migrator = create_outbox_event_migrator();
            let mut events = Vec::new();
            for path in list_toml_files(&dir)? {
                match VersionedTomlFile::new(path.clone(), ENTITY, &migrator).load::<OutboxEvent>() {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "Skipping unreadable outbox file: {}", e);
                    }
                }
            }
            events.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(events)
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn modify<F, R>(&self, event_id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut OutboxEvent) -> R + Send + 'static,
        R: Send + 'static,
    {
        let path = self.event_path(event_id);
        let id = event_id.to_string();

        task::spawn_blocking(move || {
            let migrator = create_outbox_event_migrator();
            let mut result = None;
            let updated = VersionedTomlFile::new(path, ENTITY, &migrator)
                .update::<OutboxEvent, _>(|event| {
                    result = Some(f(event));
                    Ok(())
                })?;
            match (updated, result) {
                (Some(_), Some(result)) => Ok(result),
                _ => Err(ProofingError::not_found("OutboxEvent", id)),
            }
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }
}

#[async_trait]
impl OutboxRepository for TomlOutboxRepository {
    async fn enqueue(&self, event: &OutboxEvent) -> Result<()> {
        let path = self.event_path(&event.id);
        let event = event.clone();

        task::spawn_blocking(move || {
            let migrator = create_outbox_event_migrator();
            VersionedTomlFile::new(path, ENTITY, &migrator).save(&event)
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn pending(&self) -> Result<Vec<OutboxEvent>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(OutboxEvent::is_pending)
            .collect())
    }

    async fn mark_delivered(&self, event_id: &str) -> Result<()> {
        self.modify(event_id, |event| event.mark_delivered()).await
    }

    async fn record_failure(
        &self,
        event_id: &str,
        error: &str,
        max_attempts: u32,
    ) -> Result<OutboxStatus> {
        let error = error.to_string();
        self.modify(event_id, move |event| event.record_failure(error, max_attempts))
            .await
    }
}
