//! Hand-written in-memory doubles for the repository and provider traits.

use async_trait::async_trait;
use proofing_core::error::{ProofingError, Result};
use proofing_core::gallery::{CandidatePhoto, FileListingProvider};
use proofing_core::notification::{
    CompletionNotice, NotificationDispatcher, OutboxEvent, OutboxRepository, OutboxStatus,
};
use proofing_core::selection::{
    SelectedPhoto, SelectionSession, SelectionSessionRepository, SessionStatus,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockSelectionSessionRepository {
    sessions: Mutex<HashMap<String, SelectionSession>>,
    fail_saves: AtomicBool,
    save_calls: AtomicUsize,
}

impl MockSelectionSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: SelectionSession) -> Self {
        let repo = Self::new();
        repo.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
        repo
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self, session_id: &str) -> Option<SelectionSession> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }

    fn check_save(&self) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ProofingError::data_access("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SelectionSessionRepository for MockSelectionSessionRepository {
    async fn find_by_token(&self, access_token: &str) -> Result<Option<SelectionSession>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .values()
            .find(|s| s.access_token == access_token)
            .cloned())
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<SelectionSession>> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn find_by_project(&self, project_id: &str) -> Result<Option<SelectionSession>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .values()
            .find(|s| s.project_id == project_id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<SelectionSession>> {
        let mut all: Vec<_> = self.sessions.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn create(&self, session: &SelectionSession) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions
            .values()
            .any(|s| s.access_token == session.access_token)
        {
            return Err(ProofingError::invalid_input("Access token already in use"));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn save_selection(
        &self,
        session_id: &str,
        selection_data: &[SelectedPhoto],
        status: Option<SessionStatus>,
    ) -> Result<()> {
        self.check_save()?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ProofingError::not_found("SelectionSession", session_id))?;
        session.replace_selection(selection_data.iter().cloned());
        if let Some(status) = status {
            session.status = status;
        }
        Ok(())
    }

    async fn save_status(&self, session_id: &str, status: SessionStatus) -> Result<()> {
        self.check_save()?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ProofingError::not_found("SelectionSession", session_id))?;
        session.status = status;
        Ok(())
    }

    async fn update(&self, session: &SelectionSession) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if !sessions.contains_key(&session.id) {
            return Err(ProofingError::not_found("SelectionSession", session.id.clone()));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockOutboxRepository {
    events: Mutex<Vec<OutboxEvent>>,
    fail_enqueue: AtomicBool,
}

impl MockOutboxRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_enqueue(&self, fail: bool) {
        self.fail_enqueue.store(fail, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<OutboxEvent> {
        self.events.lock().unwrap().clone()
    }

    fn with_event<R>(&self, event_id: &str, f: impl FnOnce(&mut OutboxEvent) -> R) -> Result<R> {
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| ProofingError::not_found("OutboxEvent", event_id))?;
        Ok(f(event))
    }
}

#[async_trait]
impl OutboxRepository for MockOutboxRepository {
    async fn enqueue(&self, event: &OutboxEvent) -> Result<()> {
        if self.fail_enqueue.load(Ordering::SeqCst) {
            return Err(ProofingError::io("disk full"));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<OutboxEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is_pending())
            .cloned()
            .collect())
    }

    async fn mark_delivered(&self, event_id: &str) -> Result<()> {
        self.with_event(event_id, |e| e.mark_delivered())
    }

    async fn record_failure(
        &self,
        event_id: &str,
        error: &str,
        max_attempts: u32,
    ) -> Result<OutboxStatus> {
        self.with_event(event_id, |e| e.record_failure(error, max_attempts))
    }
}

#[derive(Default)]
pub struct MockDispatcher {
    sent: Mutex<Vec<CompletionNotice>>,
    fail: AtomicBool,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let dispatcher = Self::default();
        dispatcher.fail.store(true, Ordering::SeqCst);
        dispatcher
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<CompletionNotice> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for MockDispatcher {
    async fn send_completion(&self, notice: &CompletionNotice) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProofingError::notification("smtp down"));
        }
        self.sent.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockFileListingProvider {
    photos: Mutex<Vec<CandidatePhoto>>,
    fail: AtomicBool,
}

impl MockFileListingProvider {
    pub fn with_photos(count: usize) -> Self {
        let provider = Self::default();
        *provider.photos.lock().unwrap() = (0..count)
            .map(|i| CandidatePhoto {
                id: format!("p{}", i),
                name: format!("IMG_{:04}.jpg", i),
                thumbnail_url: format!("https://cdn.test/t/{}", i),
                full_res_url: format!("https://cdn.test/f/{}", i),
            })
            .collect();
        provider
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileListingProvider for MockFileListingProvider {
    async fn list(&self, _folder_reference: &str) -> Result<Vec<CandidatePhoto>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProofingError::provider("listing API unavailable"));
        }
        Ok(self.photos.lock().unwrap().clone())
    }
}
