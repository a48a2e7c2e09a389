//! # Event Publisher
//!
//! One `tokio::sync::broadcast` channel carries every [`BridgeEvent`]. Each
//! subscriber owns a receiver and filters on its side, so a subscriber sees
//! every event in publish order, including ones its filter then skips.

use crate::events::{BridgeEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

/// Publishing side of the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns how many subscribers it reached.
    async fn publish(&self, event: BridgeEvent) -> usize;
}

/// In-process bus shared by the host and every correlator.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<BridgeEvent>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// A bus buffering at most `capacity` unread events per subscriber.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Subscribe to events matching `filter`, starting with the next publish.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(
            topics = ?filter.topics,
            correlators = ?filter.correlators,
            "New subscription created"
        );
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// How many triggers a host may keep unresolved at once without any
    /// subscriber that keeps up with it lagging.
    ///
    /// Every trigger puts two events on the bus: itself and exactly one
    /// outcome. A correlator's backlog holds its unread triggers with its own
    /// outcomes interleaved between them, so at this limit it stays within
    /// about half the buffer.
    #[must_use]
    pub fn in_flight_limit(&self) -> usize {
        (self.capacity / 4).max(1)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: BridgeEvent) -> usize {
        let topic = event.topic();
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!(topic = ?topic, receivers, "Event published");
        receivers
    }
}
