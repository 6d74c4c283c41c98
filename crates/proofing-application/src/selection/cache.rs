use proofing_core::selection::SelectionSession;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory cache of session records.
///
/// Entries stay until [`SessionCache::invalidate`] or [`SessionCache::clear`]
/// is called. Operator writes, client saves and `close` invalidate the
/// affected session.
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: RwLock<HashMap<String, SelectionSession>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a cached session by ID.
    pub async fn get(&self, session_id: &str) -> Option<SelectionSession> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Gets a cached session by client access token.
    pub async fn get_by_token(&self, access_token: &str) -> Option<SelectionSession> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .find(|s| s.access_token == access_token)
            .cloned()
    }

    pub async fn insert(&self, session: SelectionSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
    }

    /// Drops one session so the next read goes to the repository.
    pub async fn invalidate(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    pub async fn clear(&self) {
        let mut sessions = self.sessions.write().await;
        sessions.clear();
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofing_core::selection::SelectionSettings;

    #[tokio::test]
    async fn test_insert_get_invalidate() {
        let cache = SessionCache::new();
        let session = SelectionSession::new("p1", "f", "TOKEN001", SelectionSettings::with_total(1));
        let id = session.id.clone();

        cache.insert(session).await;
        assert!(cache.get(&id).await.is_some());
        assert_eq!(cache.get_by_token("TOKEN001").await.map(|s| s.id), Some(id.clone()));

        cache.invalidate(&id).await;
        assert!(cache.get(&id).await.is_none());
        assert!(cache.get_by_token("TOKEN001").await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = SessionCache::new();
        cache
            .insert(SelectionSession::new("p1", "f", "T1", SelectionSettings::with_total(1)))
            .await;
        cache
            .insert(SelectionSession::new("p2", "f", "T2", SelectionSettings::with_total(1)))
            .await;
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
