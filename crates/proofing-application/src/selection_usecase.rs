//! Client selection use case.
//!
//! Ties one opened session's state machine to the store, the auto-save loop,
//! the event bus, and the completion outbox.

use chrono::NaiveDate;
use proofing_core::error::{ProofingError, Result};
use proofing_core::notification::{CompletionNotice, OutboxEvent, OutboxRepository};
use proofing_core::selection::{
    CompletionReadiness, ConsentAffirmation, Rejection, SaveSnapshot, SelectionChange,
    SelectionEvent, SelectionSession, SelectionSessionRepository, SelectionStateMachine,
    SessionStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::selection::{AutoSaveController, SelectionEventBus, SessionCache};

/// What `complete` achieved beyond locking the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub session_id: String,
    pub revision: u64,
    /// Outbox event id, or `None` if the event could not be recorded. The
    /// completion stands either way.
    pub outbox_event_id: Option<String>,
}

/// The session currently opened by this client.
struct ActiveSelection {
    session: SelectionSession,
    machine: Arc<Mutex<SelectionStateMachine>>,
    autosave: Arc<AutoSaveController>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Use case for a client selecting photos through an access link.
///
/// # Responsibilities
///
/// - Resolving the access token and enforcing expiration
/// - Routing mutations to the state machine and publishing their outcome
/// - Running auto-save for the opened session
/// - Completing: lock, immediate save, outbox event, event publish
pub struct SelectionUseCase {
    repository: Arc<dyn SelectionSessionRepository>,
    outbox: Arc<dyn OutboxRepository>,
    cache: Arc<SessionCache>,
    events: SelectionEventBus,
    autosave_interval: Duration,
    active: RwLock<Option<ActiveSelection>>,
}

impl SelectionUseCase {
    pub fn new(
        repository: Arc<dyn SelectionSessionRepository>,
        outbox: Arc<dyn OutboxRepository>,
        cache: Arc<SessionCache>,
        events: SelectionEventBus,
        autosave_interval: Duration,
    ) -> Self {
        Self {
            repository,
            outbox,
            cache,
            events,
            autosave_interval,
            active: RwLock::new(None),
        }
    }

    /// Opens a session by access token, using today's local date for the
    /// expiration check.
    pub async fn open(&self, access_token: &str) -> Result<SelectionSession> {
        self.open_on(access_token, chrono::Local::now().date_naive())
            .await
    }

    /// Opens a session by access token as of `today`.
    ///
    /// Any previously opened session is closed first. The first open moves a
    /// `Waiting` session to `Viewed`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown or empty token
    /// - `Expired` when `today` is past the expiration date
    pub async fn open_on(&self, access_token: &str, today: NaiveDate) -> Result<SelectionSession> {
        self.close().await;

        let token = access_token.trim();
        if token.is_empty() {
            return Err(ProofingError::not_found("SelectionSession", "<empty token>"));
        }

        let mut session = match self.cache.get_by_token(token).await {
            Some(session) => session,
            None => self
                .repository
                .find_by_token(token)
                .await?
                .ok_or_else(|| ProofingError::not_found("SelectionSession", token))?,
        };

        if let Some(expired_on) = session.settings.expiration_date
            && session.settings.is_expired_on(today)
        {
            tracing::info!(session_id = %session.id, %expired_on, "Refusing expired session");
            return Err(ProofingError::Expired {
                session_id: session.id,
                expired_on,
            });
        }

        let mut machine = SelectionStateMachine::from_session(&session);
        if machine.mark_viewed() {
            match self
                .repository
                .save_status(&session.id, SessionStatus::Viewed)
                .await
            {
                Ok(()) => machine.mark_saved(machine.revision()),
                // Left dirty; the first auto-save tick writes the status.
                Err(e) => tracing::warn!(session_id = %session.id, "Failed to record view: {}", e),
            }
            session.status = SessionStatus::Viewed;
            tracing::info!(session_id = %session.id, "Session viewed");
            self.events.publish(SelectionEvent::StatusChanged {
                session_id: session.id.clone(),
                status: SessionStatus::Viewed,
            });
        }
        self.cache.insert(session.clone()).await;

        let machine = Arc::new(Mutex::new(machine));
        let autosave = Arc::new(AutoSaveController::new(
            machine.clone(),
            self.repository.clone(),
            self.cache.clone(),
            self.events.clone(),
            self.autosave_interval,
        ));
        let cancel = CancellationToken::new();
        let handle = autosave.clone().spawn(cancel.clone());

        *self.active.write().await = Some(ActiveSelection {
            session: session.clone(),
            machine,
            autosave,
            cancel,
            handle,
        });

        tracing::info!(session_id = %session.id, status = %session.status, "Session opened");
        Ok(session)
    }

    /// Stops auto-save for the opened session after a final flush.
    ///
    /// The cached record is dropped so a later open reads the store.
    pub async fn close(&self) {
        let active = self.active.write().await.take();
        if let Some(active) = active {
            active.cancel.cancel();
            if let Err(e) = active.handle.await {
                tracing::error!(session_id = %active.session.id, "Auto-save task failed: {}", e);
            }
            self.cache.invalidate(&active.session.id).await;
            tracing::debug!(session_id = %active.session.id, "Session closed");
        }
    }

    /// The opened session's record as loaded (settings, folder, project).
    pub async fn session(&self) -> Result<SelectionSession> {
        let active = self.active.read().await;
        let active = active.as_ref().ok_or_else(no_session)?;
        Ok(active.session.clone())
    }

    /// A copy of the current in-memory selection state.
    pub async fn state(&self) -> Result<SelectionStateMachine> {
        let machine = self.machine().await?;
        let state = machine.lock().await.clone();
        Ok(state)
    }

    pub async fn toggle_select(&self, photo_id: &str) -> Result<SelectionChange> {
        let machine = self.machine().await?;
        let mut machine = machine.lock().await;
        let result = machine.toggle_select(photo_id);
        self.report(machine.session_id(), result)
    }

    pub async fn toggle_extra(&self, photo_id: &str, extra_id: &str) -> Result<SelectionChange> {
        let machine = self.machine().await?;
        let mut machine = machine.lock().await;
        let result = machine.toggle_extra(photo_id, extra_id);
        self.report(machine.session_id(), result)
    }

    pub async fn update_comment(&self, photo_id: &str, text: &str) -> Result<SelectionChange> {
        let machine = self.machine().await?;
        let mut machine = machine.lock().await;
        let result = machine.update_comment(photo_id, text);
        self.report(machine.session_id(), result)
    }

    pub async fn validate_for_completion(&self) -> Result<CompletionReadiness> {
        let machine = self.machine().await?;
        let readiness = machine.lock().await.validate_for_completion();
        Ok(readiness)
    }

    /// Captures the current state for persistence or display.
    pub async fn snapshot(&self) -> Result<SaveSnapshot> {
        let machine = self.machine().await?;
        let snapshot = machine.lock().await.snapshot();
        Ok(snapshot)
    }

    /// Forces a save of pending changes.
    pub async fn flush(&self) -> Result<()> {
        let autosave = {
            let active = self.active.read().await;
            active.as_ref().ok_or_else(no_session)?.autosave.clone()
        };
        autosave.flush_now().await?;
        Ok(())
    }

    /// Confirms the selection.
    ///
    /// The lock and the data it covers are saved immediately, bypassing the
    /// auto-save interval. If that save fails the lock is rolled back and the
    /// error returned; the client can retry. Once saved, a completion event
    /// goes to the outbox for notification delivery.
    pub async fn complete(&self, consent: ConsentAffirmation) -> Result<CompletionOutcome> {
        let (session, machine, autosave) = {
            let active = self.active.read().await;
            let active = active.as_ref().ok_or_else(no_session)?;
            (
                active.session.clone(),
                active.machine.clone(),
                active.autosave.clone(),
            )
        };

        let _save_guard = autosave.lock_saves().await;

        let (ticket, snapshot) = {
            let mut machine = machine.lock().await;
            let ticket = machine.complete(consent).inspect_err(|e| {
                tracing::debug!(session_id = %session.id, "Completion refused: {}", e);
            })?;
            (ticket, machine.snapshot())
        };

        if let Err(e) = self
            .repository
            .save_selection(&session.id, &snapshot.entries, Some(SessionStatus::Completed))
            .await
        {
            machine.lock().await.rollback_completion(ticket);
            tracing::warn!(session_id = %session.id, "Completion save failed, lock rolled back: {}", e);
            self.events.publish(SelectionEvent::SaveFailed {
                session_id: session.id.clone(),
                error: e.to_string(),
            });
            return Err(e);
        }
        machine.lock().await.mark_saved(snapshot.revision);

        self.cache.invalidate(&session.id).await;
        self.events.publish(SelectionEvent::Saved {
            session_id: session.id.clone(),
            revision: snapshot.revision,
        });
        self.events.publish(SelectionEvent::StatusChanged {
            session_id: session.id.clone(),
            status: SessionStatus::Completed,
        });
        tracing::info!(session_id = %session.id, revision = snapshot.revision, "Selection completed");

        let mut completed = session;
        completed.replace_selection(snapshot.entries);
        completed.status = SessionStatus::Completed;
        let event = OutboxEvent::selection_completed(CompletionNotice::from_session(&completed));

        let outbox_event_id = match self.outbox.enqueue(&event).await {
            Ok(()) => {
                tracing::debug!(session_id = %completed.id, event_id = %event.id, "Completion event queued");
                Some(event.id)
            }
            Err(e) => {
                tracing::error!(
                    session_id = %completed.id,
                    "Completion saved but outbox event could not be recorded: {}",
                    e
                );
                None
            }
        };

        Ok(CompletionOutcome {
            session_id: completed.id,
            revision: snapshot.revision,
            outbox_event_id,
        })
    }

    async fn machine(&self) -> Result<Arc<Mutex<SelectionStateMachine>>> {
        let active = self.active.read().await;
        Ok(active.as_ref().ok_or_else(no_session)?.machine.clone())
    }

    /// Logs and publishes a mutation outcome.
    fn report(
        &self,
        session_id: &str,
        result: std::result::Result<SelectionChange, Rejection>,
    ) -> Result<SelectionChange> {
        match result {
            Ok(change) => {
                tracing::debug!(session_id = %session_id, ?change, "Selection changed");
                self.events.publish(SelectionEvent::Changed {
                    session_id: session_id.to_string(),
                    change: change.clone(),
                });
                Ok(change)
            }
            Err(rejection) => {
                tracing::debug!(session_id = %session_id, %rejection, "Selection change rejected");
                self.events.publish(SelectionEvent::Rejected {
                    session_id: session_id.to_string(),
                    reason: rejection.to_string(),
                });
                Err(rejection.into())
            }
        }
    }
}

fn no_session() -> ProofingError {
    ProofingError::invalid_input("No selection session is open")
}

#[cfg(test)]
#[path = "selection_usecase_test.rs"]
mod tests;
