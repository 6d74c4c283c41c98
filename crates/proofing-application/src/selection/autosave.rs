//! Periodic persistence of the client's selection.
//!
//! The state machine is the source of truth while the client is selecting.
//! The controller copies it to the store on a fixed interval when dirty, and
//! on demand through [`AutoSaveController::flush_now`]. Saves are serialized
//! by an internal lock so a forced save never races a tick. Each successful
//! save drops the session from the [`SessionCache`] so the next open reads
//! the stored selection.

use proofing_core::error::Result;
use proofing_core::selection::{SelectionEvent, SelectionSessionRepository, SelectionStateMachine};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::cache::SessionCache;
use super::event_bus::SelectionEventBus;

/// Result of a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to save.
    Clean,
    /// Everything up to `revision` is in the store.
    Saved { revision: u64 },
}

pub struct AutoSaveController {
    machine: Arc<Mutex<SelectionStateMachine>>,
    repository: Arc<dyn SelectionSessionRepository>,
    cache: Arc<SessionCache>,
    events: SelectionEventBus,
    interval: Duration,
    save_lock: Mutex<()>,
}

impl AutoSaveController {
    pub fn new(
        machine: Arc<Mutex<SelectionStateMachine>>,
        repository: Arc<dyn SelectionSessionRepository>,
        cache: Arc<SessionCache>,
        events: SelectionEventBus,
        interval: Duration,
    ) -> Self {
        Self {
            machine,
            repository,
            cache,
            events,
            interval,
            save_lock: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Holds off every other save until the guard is dropped.
    pub(crate) async fn lock_saves(&self) -> MutexGuard<'_, ()> {
        self.save_lock.lock().await
    }

    /// Saves now if dirty.
    ///
    /// # Errors
    ///
    /// Returns the store error. The machine stays dirty and the next tick
    /// retries.
    pub async fn flush_now(&self) -> Result<SaveOutcome> {
        let _guard = self.lock_saves().await;
        self.flush_locked().await
    }

    /// Flush body; the caller holds the save lock.
    pub(crate) async fn flush_locked(&self) -> Result<SaveOutcome> {
        let snapshot = {
            let machine = self.machine.lock().await;
            if !machine.is_dirty() {
                return Ok(SaveOutcome::Clean);
            }
            machine.snapshot()
        };

        let result = self
            .repository
            .save_selection(&snapshot.session_id, &snapshot.entries, Some(snapshot.status))
            .await;

        match result {
            Ok(()) => {
                self.machine.lock().await.mark_saved(snapshot.revision);
                self.cache.invalidate(&snapshot.session_id).await;
                tracing::debug!(
                    session_id = %snapshot.session_id,
                    revision = snapshot.revision,
                    "Selection saved"
                );
                self.events.publish(SelectionEvent::Saved {
                    session_id: snapshot.session_id,
                    revision: snapshot.revision,
                });
                Ok(SaveOutcome::Saved {
                    revision: snapshot.revision,
                })
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %snapshot.session_id,
                    revision = snapshot.revision,
                    "Auto-save failed, will retry: {}",
                    e
                );
                self.events.publish(SelectionEvent::SaveFailed {
                    session_id: snapshot.session_id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Starts the periodic save loop.
    ///
    /// On cancellation the loop performs one last flush and exits. A save in
    /// progress when the token fires is allowed to finish.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        if let Err(e) = self.flush_now().await {
                            tracing::warn!("Final flush failed: {}", e);
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        // Failures are logged and published by flush_now.
                        let _ = self.flush_now().await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockSelectionSessionRepository;
    use proofing_core::selection::{SelectionSession, SelectionSettings, SessionStatus};

    fn setup() -> (
        Arc<MockSelectionSessionRepository>,
        Arc<Mutex<SelectionStateMachine>>,
        Arc<AutoSaveController>,
        SelectionEventBus,
    ) {
        let session = SelectionSession::new("p1", "f", "TOKEN001", SelectionSettings::with_total(3));
        let repo = Arc::new(MockSelectionSessionRepository::with_session(session.clone()));
        let machine = Arc::new(Mutex::new(SelectionStateMachine::from_session(&session)));
        let events = SelectionEventBus::new();
        let controller = Arc::new(AutoSaveController::new(
            machine.clone(),
            repo.clone(),
            Arc::new(SessionCache::new()),
            events.clone(),
            Duration::from_secs(30),
        ));
        (repo, machine, controller, events)
    }

    #[tokio::test]
    async fn test_clean_machine_is_not_saved() {
        let (repo, _machine, controller, _) = setup();

        assert_eq!(controller.flush_now().await.unwrap(), SaveOutcome::Clean);
        assert_eq!(repo.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_flush_saves_and_clears_dirty() {
        let (repo, machine, controller, events) = setup();
        let mut rx = events.subscribe();
        let session_id = {
            let mut m = machine.lock().await;
            m.toggle_select("A").unwrap();
            m.session_id().to_string()
        };

        let outcome = controller.flush_now().await.unwrap();

        assert_eq!(outcome, SaveOutcome::Saved { revision: 1 });
        assert!(!machine.lock().await.is_dirty());
        let stored = repo.stored(&session_id).unwrap();
        assert!(stored.selection_data["A"].selected);
        assert_eq!(stored.status, SessionStatus::Selecting);
        assert!(matches!(rx.recv().await.unwrap(), SelectionEvent::Saved { revision: 1, .. }));
    }

    #[tokio::test]
    async fn test_successful_save_drops_cached_record() {
        let session = SelectionSession::new("p1", "f", "TOKEN001", SelectionSettings::with_total(3));
        let repo = Arc::new(MockSelectionSessionRepository::with_session(session.clone()));
        let machine = Arc::new(Mutex::new(SelectionStateMachine::from_session(&session)));
        let cache = Arc::new(SessionCache::new());
        cache.insert(session.clone()).await;
        let controller = AutoSaveController::new(
            machine.clone(),
            repo.clone(),
            cache.clone(),
            SelectionEventBus::new(),
            Duration::from_secs(30),
        );

        repo.set_fail_saves(true);
        machine.lock().await.toggle_select("A").unwrap();
        assert!(controller.flush_now().await.is_err());
        assert!(cache.get(&session.id).await.is_some());

        repo.set_fail_saves(false);
        controller.flush_now().await.unwrap();
        assert!(cache.get(&session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_dirty_and_retries() {
        let (repo, machine, controller, events) = setup();
        let mut rx = events.subscribe();
        machine.lock().await.toggle_select("A").unwrap();
        repo.set_fail_saves(true);

        assert!(controller.flush_now().await.is_err());
        assert!(machine.lock().await.is_dirty());
        assert!(matches!(rx.recv().await.unwrap(), SelectionEvent::SaveFailed { .. }));

        repo.set_fail_saves(false);
        assert!(matches!(
            controller.flush_now().await.unwrap(),
            SaveOutcome::Saved { .. }
        ));
        assert!(!machine.lock().await.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_tick_saves_dirty_state() {
        let (repo, machine, controller, _) = setup();
        let cancel = CancellationToken::new();
        let handle = controller.clone().spawn(cancel.clone());

        machine.lock().await.toggle_select("A").unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert!(!machine.lock().await.is_dirty());
        assert_eq!(repo.save_calls(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_flushes_pending_changes() {
        let (repo, machine, controller, _) = setup();
        let cancel = CancellationToken::new();
        let handle = controller.clone().spawn(cancel.clone());

        machine.lock().await.toggle_select("A").unwrap();
        cancel.cancel();
        handle.await.unwrap();

        assert!(!machine.lock().await.is_dirty());
        assert_eq!(repo.save_calls(), 1);
    }
}
