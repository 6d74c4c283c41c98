use proofing_core::selection::SelectionEvent;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of [`SelectionEvent`]s to any number of views and workers.
///
/// Publishing never blocks. Slow subscribers lag and miss old events rather
/// than holding back the publisher.
#[derive(Debug, Clone)]
pub struct SelectionEventBus {
    sender: broadcast::Sender<SelectionEvent>,
}

impl SelectionEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Returns the number of subscribers that got it.
    pub fn publish(&self, event: SelectionEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => 0,
        }
    }
}

impl Default for SelectionEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let bus = SelectionEventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let delivered = bus.publish(SelectionEvent::SessionInvalidated {
            session_id: "s1".to_string(),
        });

        assert_eq!(delivered, 2);
        assert_eq!(a.recv().await.unwrap().session_id(), "s1");
        assert_eq!(b.recv().await.unwrap().session_id(), "s1");
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = SelectionEventBus::new();
        assert_eq!(
            bus.publish(SelectionEvent::Saved {
                session_id: "s1".to_string(),
                revision: 1
            }),
            0
        );
    }
}
