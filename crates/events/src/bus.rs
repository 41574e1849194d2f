//! In-process fan-out of [`DomainEvent`]s over a `tokio::sync::broadcast`
//! channel.
//!
//! Handlers publish once their write has committed. Each background consumer
//! (event log, mailer) owns a receiver and runs it through [`consume`].

use std::future::Future;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::event::DomainEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Shared as `Arc<EventBus>` in the API state.
///
/// ```rust
/// use cinema_events::{DomainEvent, EventBus, EventKind};
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
/// bus.publish(DomainEvent::new(EventKind::SessionCreated, 1));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Receivers further than `capacity` events behind skip the oldest ones
    /// and see [`RecvError::Lagged`].
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// Fire and forget; with nobody listening the event is dropped.
    pub fn publish(&self, event: DomainEvent) {
        let kind = event.kind;
        match self.sender.send(event) {
            Ok(receivers) => tracing::trace!(%kind, receivers, "Event published"),
            Err(_) => tracing::trace!(%kind, "Event published with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Feed every event from `receiver` to `handle`, one at a time, until the
/// bus is dropped. Lag is logged and skipped. Returns the number of events
/// handled.
pub async fn consume<F, Fut>(
    consumer: &'static str,
    mut receiver: broadcast::Receiver<DomainEvent>,
    mut handle: F,
) -> u64
where
    F: FnMut(DomainEvent) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut handled = 0;
    loop {
        match receiver.recv().await {
            Ok(event) => {
                handle(event).await;
                handled += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(consumer, skipped, "Event consumer fell behind, events skipped");
            }
            Err(RecvError::Closed) => {
                tracing::info!(consumer, handled, "Event bus closed, consumer stopping");
                return handled;
            }
        }
    }
}
