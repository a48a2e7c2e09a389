//! # Subscriptions
//!
//! A [`Subscription`] is a broadcast receiver plus the [`EventFilter`] it was
//! created with. Events that do not match are skipped inside `recv`.
//!
//! Falling more than the bus capacity behind is not silent: `recv` returns
//! [`SubscriptionError::Lagged`] once with the number of skipped events, then
//! resumes from the oldest event still buffered.

use crate::events::{BridgeEvent, EventFilter};
use thiserror::Error;
use tokio::sync::broadcast;

/// Why `recv` returned without an event.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Event bus closed")]
    Closed,

    /// This subscription fell behind and the bus overwrote events it had
    /// not read yet. The count covers all skipped events, matching or not.
    #[error("Subscription lagged, {0} events skipped")]
    Lagged(u64),
}

/// Receiving side of one subscriber.
pub struct Subscription {
    receiver: broadcast::Receiver<BridgeEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<BridgeEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Wait for the next event matching the filter.
    ///
    /// # Errors
    ///
    /// - `SubscriptionError::Lagged(n)` - `n` events were lost; the next call
    ///   continues with the oldest buffered event
    /// - `SubscriptionError::Closed` - the bus is gone
    pub async fn recv(&mut self) -> Result<BridgeEvent, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Err(SubscriptionError::Lagged(skipped))
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }
}
