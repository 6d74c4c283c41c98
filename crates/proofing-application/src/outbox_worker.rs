//! Delivery of completion notices recorded in the outbox.
//!
//! Completion only writes an outbox event; this worker turns pending events
//! into notifications. A failed send leaves the event pending with its
//! attempt counter raised, until `max_attempts` marks it failed. Nothing
//! here ever touches the session itself.

use proofing_core::error::Result;
use proofing_core::notification::{NotificationDispatcher, OutboxRepository, OutboxStatus};
use proofing_core::selection::{SelectionEvent, SessionStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Counts from one pass over the pending events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    /// Failed this time, still pending.
    pub retried: usize,
    /// Failed for the last allowed time.
    pub failed: usize,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.retried == 0 && self.failed == 0
    }
}

enum Wake {
    Tick,
    Completion,
    Closed,
    Cancelled,
}

pub struct OutboxWorker {
    outbox: Arc<dyn OutboxRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    max_attempts: u32,
    poll_interval: Duration,
    drain_lock: Mutex<()>,
}

impl OutboxWorker {
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        max_attempts: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            outbox,
            dispatcher,
            max_attempts: max_attempts.max(1),
            poll_interval,
            drain_lock: Mutex::new(()),
        }
    }

    /// Sends every pending event once.
    ///
    /// # Errors
    ///
    /// Returns an error only when the outbox itself cannot be read or
    /// updated. Dispatch failures are recorded on the event.
    pub async fn run_once(&self) -> Result<DrainReport> {
        let _guard = self.drain_lock.lock().await;
        let mut report = DrainReport::default();

        for event in self.outbox.pending().await? {
            match self.dispatcher.send_completion(&event.notice).await {
                Ok(()) => {
                    self.outbox.mark_delivered(&event.id).await?;
                    tracing::info!(
                        event_id = %event.id,
                        session_id = %event.notice.session_id,
                        "Completion notice delivered"
                    );
                    report.delivered += 1;
                }
                Err(e) => {
                    let status = self
                        .outbox
                        .record_failure(&event.id, &e.to_string(), self.max_attempts)
                        .await?;
                    if status == OutboxStatus::Failed {
                        tracing::error!(
                            event_id = %event.id,
                            session_id = %event.notice.session_id,
                            attempts = event.attempts + 1,
                            "Giving up on completion notice: {}",
                            e
                        );
                        report.failed += 1;
                    } else {
                        tracing::warn!(
                            event_id = %event.id,
                            attempts = event.attempts + 1,
                            "Completion notice not sent, will retry: {}",
                            e
                        );
                        report.retried += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Starts the delivery loop.
    ///
    /// The outbox is drained on every poll tick and, when `completions` is
    /// given, as soon as a session reports `Completed` on the event bus.
    pub fn spawn(
        self: Arc<Self>,
        cancel: CancellationToken,
        mut completions: Option<broadcast::Receiver<SelectionEvent>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let wake = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Wake::Cancelled,
                    _ = ticker.tick() => Wake::Tick,
                    woke = next_completion(&mut completions) => woke,
                };

                match wake {
                    Wake::Cancelled => break,
                    Wake::Closed => {
                        tracing::debug!("Event bus closed, outbox falls back to polling");
                        completions = None;
                        continue;
                    }
                    Wake::Tick | Wake::Completion => {}
                }

                match self.run_once().await {
                    Ok(report) if !report.is_empty() => {
                        tracing::debug!(?report, "Outbox pass finished");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Outbox pass failed: {}", e),
                }
            }
        })
    }
}

/// Waits for the next completion on the bus. Pends forever without a receiver.
async fn next_completion(completions: &mut Option<broadcast::Receiver<SelectionEvent>>) -> Wake {
    let Some(rx) = completions else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(SelectionEvent::StatusChanged {
                status: SessionStatus::Completed,
                ..
            }) => return Wake::Completion,
            Ok(_) => continue,
            // A completion may be among the skipped events.
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Outbox listener lagged");
                return Wake::Completion;
            }
            Err(RecvError::Closed) => return Wake::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionEventBus;
    use crate::test_support::{MockDispatcher, MockOutboxRepository};
    use proofing_core::notification::{CompletionNotice, OutboxEvent};

    fn notice(session_id: &str) -> CompletionNotice {
        CompletionNotice {
            session_id: session_id.to_string(),
            project_id: "project".to_string(),
            selected_count: 2,
            total_limit: 2,
            extras: Vec::new(),
            commented_photos: Vec::new(),
            completed_at: "2025-06-01T10:00:00+00:00".to_string(),
        }
    }

    async fn queued(outbox: &MockOutboxRepository, session_id: &str) -> OutboxEvent {
        let event = OutboxEvent::selection_completed(notice(session_id));
        outbox.enqueue(&event).await.unwrap();
        event
    }

    #[tokio::test]
    async fn test_run_once_delivers_pending() {
        let outbox = Arc::new(MockOutboxRepository::new());
        let dispatcher = Arc::new(MockDispatcher::new());
        queued(&outbox, "s1").await;
        queued(&outbox, "s2").await;
        let worker = OutboxWorker::new(outbox.clone(), dispatcher.clone(), 3, Duration::from_secs(60));

        let report = worker.run_once().await.unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(dispatcher.sent().len(), 2);
        assert!(outbox.pending().await.unwrap().is_empty());
        assert!(worker.run_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_event_until_max_attempts() {
        let outbox = Arc::new(MockOutboxRepository::new());
        let dispatcher = Arc::new(MockDispatcher::failing());
        let event = queued(&outbox, "s1").await;
        let worker = OutboxWorker::new(outbox.clone(), dispatcher.clone(), 2, Duration::from_secs(60));

        let first = worker.run_once().await.unwrap();
        assert_eq!(first.retried, 1);
        assert_eq!(outbox.pending().await.unwrap().len(), 1);

        let second = worker.run_once().await.unwrap();
        assert_eq!(second.failed, 1);

        let stored = outbox.all().into_iter().find(|e| e.id == event.id).unwrap();
        assert_eq!(stored.status, OutboxStatus::Failed);
        assert_eq!(stored.attempts, 2);
        assert_eq!(stored.last_error.as_deref(), Some("Notification error: smtp down"));
    }

    #[tokio::test]
    async fn test_recovered_dispatcher_delivers_on_next_pass() {
        let outbox = Arc::new(MockOutboxRepository::new());
        let dispatcher = Arc::new(MockDispatcher::failing());
        queued(&outbox, "s1").await;
        let worker = OutboxWorker::new(outbox.clone(), dispatcher.clone(), 5, Duration::from_secs(60));

        worker.run_once().await.unwrap();
        dispatcher.set_fail(false);
        let report = worker.run_once().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(outbox.all()[0].attempts, 1);
        assert_eq!(outbox.all()[0].status, OutboxStatus::Delivered);
    }

    #[tokio::test]
    async fn test_spawned_worker_wakes_on_completion() {
        let outbox = Arc::new(MockOutboxRepository::new());
        let dispatcher = Arc::new(MockDispatcher::new());
        let bus = SelectionEventBus::new();
        let worker = Arc::new(OutboxWorker::new(
            outbox.clone(),
            dispatcher.clone(),
            5,
            Duration::from_secs(3600),
        ));
        let cancel = CancellationToken::new();
        let handle = worker.spawn(cancel.clone(), Some(bus.subscribe()));

        // Let the immediate first tick pass on an empty outbox.
        tokio::time::sleep(Duration::from_millis(20)).await;
        queued(&outbox, "s1").await;
        bus.publish(SelectionEvent::StatusChanged {
            session_id: "s1".to_string(),
            status: SessionStatus::Completed,
        });

        for _ in 0..100 {
            if !dispatcher.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(dispatcher.sent().len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }
}
