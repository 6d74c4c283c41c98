//! Operator-side session management.

use proofing_core::error::{ProofingError, Result};
use proofing_core::selection::{
    SelectionEvent, SelectionSession, SelectionSessionRepository, SelectionSettings,
    SessionStatus,
};
use proofing_infrastructure::generate_access_token;
use std::sync::Arc;

use crate::selection::{SelectionEventBus, SessionCache};

/// Tries before giving up on finding an unused access token.
const MAX_TOKEN_ATTEMPTS: usize = 8;

/// Use case for the studio operator.
///
/// Every write goes to the repository first, then drops the cached copy and
/// publishes an event so open client views re-read the record.
pub struct OperatorUseCase {
    repository: Arc<dyn SelectionSessionRepository>,
    cache: Arc<SessionCache>,
    events: SelectionEventBus,
    token_length: usize,
}

impl OperatorUseCase {
    pub fn new(
        repository: Arc<dyn SelectionSessionRepository>,
        cache: Arc<SessionCache>,
        events: SelectionEventBus,
        token_length: usize,
    ) -> Self {
        Self {
            repository,
            cache,
            events,
            token_length,
        }
    }

    /// Creates a session for a project.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the project id is blank, the settings are invalid,
    ///   or the project already has a session
    pub async fn create_session(
        &self,
        project_id: &str,
        folder_reference: &str,
        settings: SelectionSettings,
    ) -> Result<SelectionSession> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(ProofingError::invalid_input("project id must not be empty"));
        }
        settings.validate()?;

        if let Some(existing) = self.repository.find_by_project(project_id).await? {
            return Err(ProofingError::invalid_input(format!(
                "project '{}' already has selection session '{}'",
                project_id, existing.id
            )));
        }

        let token = self.unused_token().await?;
        let session = SelectionSession::new(project_id, folder_reference.trim(), token, settings);
        self.repository.create(&session).await?;

        tracing::info!(
            session_id = %session.id,
            project_id = %session.project_id,
            total_limit = session.settings.total_limit,
            "Selection session created"
        );
        Ok(session)
    }

    /// Replaces the access token. Links carrying the old token stop working.
    pub async fn regenerate_token(&self, session_id: &str) -> Result<String> {
        let mut session = self.get_session(session_id).await?;
        let token = self.unused_token().await?;
        session.access_token = token.clone();
        self.repository.update(&session).await?;
        self.invalidate(session_id).await;

        tracing::info!(session_id = %session_id, "Access token regenerated");
        Ok(token)
    }

    /// Reopens a completed session for editing. The selection is kept.
    pub async fn unlock(&self, session_id: &str) -> Result<SelectionSession> {
        let mut session = self.get_session(session_id).await?;
        session.unlock()?;
        self.repository
            .save_status(session_id, SessionStatus::Selecting)
            .await?;

        self.cache.invalidate(session_id).await;
        self.events.publish(SelectionEvent::StatusChanged {
            session_id: session_id.to_string(),
            status: SessionStatus::Selecting,
        });
        tracing::info!(session_id = %session_id, "Selection session unlocked");
        Ok(session)
    }

    /// Replaces the package settings.
    ///
    /// Existing selections are not trimmed when limits shrink; completion
    /// validation reports the difference instead.
    pub async fn update_settings(
        &self,
        session_id: &str,
        settings: SelectionSettings,
    ) -> Result<SelectionSession> {
        settings.validate()?;
        let mut session = self.get_session(session_id).await?;
        session.settings = settings;
        self.repository.update(&session).await?;
        self.invalidate(session_id).await;

        tracing::info!(session_id = %session_id, "Selection settings updated");
        Ok(session)
    }

    pub async fn set_folder(
        &self,
        session_id: &str,
        folder_reference: &str,
    ) -> Result<SelectionSession> {
        let mut session = self.get_session(session_id).await?;
        session.folder_reference = folder_reference.trim().to_string();
        self.repository.update(&session).await?;
        self.invalidate(session_id).await;

        tracing::info!(session_id = %session_id, folder = %session.folder_reference, "Folder reference updated");
        Ok(session)
    }

    /// Stars or unstars a photo. Allowed in every status, since stars are
    /// operator annotations outside the client's limits.
    pub async fn set_starred(&self, session_id: &str, photo_id: &str, starred: bool) -> Result<()> {
        let mut session = self.get_session(session_id).await?;
        session.set_starred(photo_id, starred);
        self.repository
            .save_selection(session_id, &session.selection_list(), None)
            .await?;
        self.invalidate(session_id).await;

        tracing::debug!(session_id = %session_id, photo_id = %photo_id, starred, "Star updated");
        Ok(())
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        // Surface NotFound instead of silently succeeding.
        self.get_session(session_id).await?;
        self.repository.delete(session_id).await?;
        self.invalidate(session_id).await;

        tracing::info!(session_id = %session_id, "Selection session deleted");
        Ok(())
    }

    pub async fn list_sessions(&self) -> Result<Vec<SelectionSession>> {
        self.repository.list_all().await
    }

    pub async fn find_by_project(&self, project_id: &str) -> Result<Option<SelectionSession>> {
        self.repository.find_by_project(project_id).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SelectionSession> {
        self.repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ProofingError::not_found("SelectionSession", session_id))
    }

    async fn unused_token(&self) -> Result<String> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = generate_access_token(self.token_length);
            if self.repository.find_by_token(&token).await?.is_none() {
                return Ok(token);
            }
            tracing::debug!("Access token collision, retrying");
        }
        Err(ProofingError::internal(format!(
            "no unused access token after {} attempts",
            MAX_TOKEN_ATTEMPTS
        )))
    }

    async fn invalidate(&self, session_id: &str) {
        self.cache.invalidate(session_id).await;
        self.events.publish(SelectionEvent::SessionInvalidated {
            session_id: session_id.to_string(),
        });
    }
}
