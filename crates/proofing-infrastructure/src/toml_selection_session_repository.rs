//! TOML-based SelectionSessionRepository implementation.
//!
//! Stores each session as `<sessions_dir>/<session_id>.toml`.

use async_trait::async_trait;
use proofing_core::error::{ProofingError, Result};
use proofing_core::selection::{
    SelectedPhoto, SelectionSession, SelectionSessionRepository, SessionStatus,
};
use std::path::{Path, PathBuf};
use tokio::task;
use version_migrate::Migrator;

use crate::dto::create_selection_session_migrator;
use crate::storage::{VersionedTomlFile, list_toml_files};

const ENTITY: &str = "selection_session";

/// A repository storing selection sessions in individual TOML files.
///
/// # Features
///
/// - **Atomic writes**: tmp file + fsync + rename
/// - **Partial updates**: selection and status are written under a file lock
///   on top of the stored record, so operator fields are never clobbered
/// - **Version migration**: older files are upgraded on read
/// - **Async-safe**: all file I/O runs in `tokio::task::spawn_blocking`
///
/// Token lookups scan the directory; session counts per studio are small.
#[derive(Debug, Clone)]
pub struct TomlSelectionSessionRepository {
    sessions_dir: PathBuf,
}

impl TomlSelectionSessionRepository {
    /// Creates the repository, creating `sessions_dir` if needed.
    pub fn new(sessions_dir: impl AsRef<Path>) -> Result<Self> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&sessions_dir).map_err(|e| {
            ProofingError::io(format!(
                "Failed to create sessions directory '{}': {}",
                sessions_dir.display(),
                e
            ))
        })?;
        Ok(Self { sessions_dir })
    }

    fn session_file_path(&self, session_id: &str) -> Result<PathBuf> {
        if session_id.is_empty()
            || session_id.contains(['/', '\\'])
            || session_id.starts_with('.')
        {
            return Err(ProofingError::invalid_input(format!(
                "Invalid session id '{}'",
                session_id
            )));
        }
        Ok(self.sessions_dir.join(format!("{}.toml", session_id)))
    }

    fn load_all_sync(dir: &Path, migrator: &Migrator) -> Result<Vec<SelectionSession>> {
        let mut sessions = Vec::new();
        for path in list_toml_files(dir)? {
            match VersionedTomlFile::new(path.clone(), ENTITY, migrator).load::<SelectionSession>() {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping unreadable session file: {}", e);
                }
            }
        }
        Ok(sessions)
    }

    /// Runs a locked read-modify-write on one session file.
    async fn modify<F>(&self, session_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut SelectionSession) -> Result<()> + Send + 'static,
    {
        let path = self.session_file_path(session_id)?;
        let id = session_id.to_string();

        task::spawn_blocking(move || {
            let migrator = create_selection_session_migrator();
            let updated = VersionedTomlFile::new(path, ENTITY, &migrator)
                .update::<SelectionSession, _>(|session| {
                    f(session)?;
                    session.updated_at = chrono::Utc::now().to_rfc3339();
                    Ok(())
                })?;
            match updated {
                Some(_) => Ok(()),
                None => Err(ProofingError::not_found("SelectionSession", id)),
            }
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }
}

#[async_trait]
impl SelectionSessionRepository for TomlSelectionSessionRepository {
    async fn find_by_token(&self, access_token: &str) -> Result<Option<SelectionSession>> {
        if access_token.trim().is_empty() {
            return Ok(None);
        }
        let token = access_token.to_string();
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|s| s.access_token == token))
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<SelectionSession>> {
        let path = self.session_file_path(session_id)?;

        task::spawn_blocking(move || {
            let migrator = create_selection_session_migrator();
            VersionedTomlFile::new(path, ENTITY, &migrator).load::<SelectionSession>()
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn find_by_project(&self, project_id: &str) -> Result<Option<SelectionSession>> {
        let project_id = project_id.to_string();
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|s| s.project_id == project_id))
    }

    async fn list_all(&self) -> Result<Vec<SelectionSession>> {
        let dir = self.sessions_dir.clone();

        task::spawn_blocking(move || {
            let migrator = create_selection_session_migrator();
            let mut sessions = Self::load_all_sync(&dir, &migrator)?;
            sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(sessions)
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn create(&self, session: &SelectionSession) -> Result<()> {
        let path = self.session_file_path(&session.id)?;
        let dir = self.sessions_dir.clone();
        let session = session.clone();

        task::spawn_blocking(move || {
            let migrator = create_selection_session_migrator();
            if path.exists() {
                return Err(ProofingError::invalid_input(format!(
                    "Session '{}' already exists",
                    session.id
                )));
            }
            let existing = Self::load_all_sync(&dir, &migrator)?;
            if existing.iter().any(|s| s.access_token == session.access_token) {
                return Err(ProofingError::invalid_input("Access token already in use"));
            }
            VersionedTomlFile::new(path, ENTITY, &migrator).save(&session)
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn save_selection(
        &self,
        session_id: &str,
        selection_data: &[SelectedPhoto],
        status: Option<SessionStatus>,
    ) -> Result<()> {
        let entries = selection_data.to_vec();
        self.modify(session_id, move |session| {
            session.replace_selection(entries);
            if let Some(status) = status {
                session.status = status;
            }
            Ok(())
        })
        .await
    }

    async fn save_status(&self, session_id: &str, status: SessionStatus) -> Result<()> {
        self.modify(session_id, move |session| {
            session.status = status;
            Ok(())
        })
        .await
    }

    async fn update(&self, session: &SelectionSession) -> Result<()> {
        let replacement = session.clone();
        self.modify(&session.id, move |stored| {
            let created_at = std::mem::take(&mut stored.created_at);
            *stored = replacement;
            stored.created_at = created_at;
            Ok(())
        })
        .await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.session_file_path(session_id)?;

        task::spawn_blocking(move || {
            let migrator = create_selection_session_migrator();
            VersionedTomlFile::new(path, ENTITY, &migrator).remove()?;
            Ok(())
        })
        .await
        .map_err(|e| ProofingError::io(format!("Failed to spawn blocking task: {}", e)))?
    }
}
