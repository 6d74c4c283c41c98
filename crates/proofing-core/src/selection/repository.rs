//! Selection session repository trait.
//!
//! Defines the interface for selection session persistence operations.

use async_trait::async_trait;

use super::model::{SelectedPhoto, SelectionSession, SessionStatus};
use crate::error::Result;

/// An abstract repository for managing selection session persistence.
///
/// This trait defines the contract for persisting and retrieving sessions,
/// decoupling the selection logic from the specific storage mechanism
/// (e.g., TOML files, a hosted database).
///
/// # Implementation Notes
///
/// Implementations should handle:
/// - Schema versioning and migrations
/// - Partial updates of `selection_data` and `status` independently
/// - Last-writer-wins semantics (no version check is expected)
#[async_trait]
pub trait SelectionSessionRepository: Send + Sync {
    /// Finds a session by its client access token.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(SelectionSession))`: Token matches a session
    /// - `Ok(None)`: No session uses this token (stale or invalid link)
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_token(&self, access_token: &str) -> Result<Option<SelectionSession>>;

    /// Finds a session by its ID.
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SelectionSession>>;

    /// Finds the session attached to a project, if any.
    async fn find_by_project(&self, project_id: &str) -> Result<Option<SelectionSession>>;

    /// Lists all stored sessions.
    async fn list_all(&self) -> Result<Vec<SelectionSession>>;

    /// Stores a newly created session.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID or access token is already in use.
    async fn create(&self, session: &SelectionSession) -> Result<()>;

    /// Writes the client-owned part of a session.
    ///
    /// # Arguments
    ///
    /// * `session_id` - The session to update
    /// * `selection_data` - Full replacement of the selection entries
    /// * `status` - New status, or `None` to leave it untouched
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Saved
    /// - `Err(NotFound)`: No such session
    async fn save_selection(
        &self,
        session_id: &str,
        selection_data: &[SelectedPhoto],
        status: Option<SessionStatus>,
    ) -> Result<()>;

    /// Writes the status alone, leaving the selection untouched.
    async fn save_status(&self, session_id: &str, status: SessionStatus) -> Result<()>;

    /// Replaces a whole session record (operator edits).
    async fn update(&self, session: &SelectionSession) -> Result<()>;

    /// Deletes a session from storage.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Session deleted successfully (or didn't exist)
    /// - `Err(_)`: Error occurred during deletion
    async fn delete(&self, session_id: &str) -> Result<()>;
}
