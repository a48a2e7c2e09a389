//! Event Bus Adapter for a request correlator
//!
//! Owns one correlator inside a single task. Triggers addressed to the
//! correlator's name arrive on the bus; a ticker polls the exchange at the
//! configured interval while a request is pending and stays quiet otherwise.
//! Outcomes are published back to the bus for hosts that listen instead of
//! passing a callback.

use bridge_telemetry::log_event;
use parking_lot::Mutex;
use shared_bus::{
    AbandonReason, BridgeEvent, EventFilter, EventPublisher, InMemoryEventBus, ResponseCallback,
    Subscription, SubscriptionError,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::{PollOutcome, RequestId, ResponseHandler};
use crate::metrics::CorrelatorMetrics;
use crate::ports::{Clock, CorrelatorApi, RequestExchange};
use crate::service::RequestCorrelator;

/// Args carried through the correlator for a bus-triggered request.
pub type TriggerArgs = (serde_json::Value, Option<ResponseCallback>);

/// A response handed over by the correlator's callback, waiting to be
/// published.
#[derive(Debug)]
struct Delivery {
    response: serde_json::Value,
    args: serde_json::Value,
}

/// Bus adapter for one named correlator
pub struct CorrelatorBusAdapter<E, C>
where
    E: RequestExchange,
    C: Clock,
{
    /// Reference to the event bus
    bus: Arc<InMemoryEventBus>,
    /// Triggers addressed to this correlator
    subscription: Subscription,
    /// The correlator itself
    correlator: RequestCorrelator<E, C, TriggerArgs>,
    /// Filled by the callback during the poll that delivers, emptied right after
    delivered: Arc<Mutex<Option<Delivery>>>,
}

impl<E, C> CorrelatorBusAdapter<E, C>
where
    E: RequestExchange,
    C: Clock,
{
    /// Create the adapter and subscribe immediately, so triggers published
    /// before `run` starts are not lost.
    pub fn new(
        bus: Arc<InMemoryEventBus>,
        correlator: RequestCorrelator<E, C, TriggerArgs>,
    ) -> Self {
        let subscription = bus.subscribe(EventFilter::for_correlator(correlator.name()));
        Self {
            bus,
            subscription,
            correlator,
            delivered: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        self.correlator.name()
    }

    pub fn metrics(&self) -> Arc<CorrelatorMetrics> {
        self.correlator.metrics()
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped) or the
    /// bus closes.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let name = self.correlator.name().to_string();
        let mut ticker = interval(self.correlator.config().poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log_event!(
            info,
            name,
            "Correlator listening for triggers",
            timeout_ms = self.correlator.config().timeout.as_duration().as_millis() as u64
        );

        loop {
            let pending = self.correlator.is_pending();
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = self.subscription.recv() => match event {
                    Ok(event) => {
                        if self.handle_event(event).await {
                            // First poll one full interval after the write
                            ticker.reset();
                        }
                    }
                    Err(SubscriptionError::Lagged(skipped)) => {
                        // Triggers among the skipped events never reach the
                        // correlator and get no outcome
                        self.metrics().record_bus_lag(skipped);
                        log_event!(
                            warn,
                            name,
                            "Fell behind on the bus, triggers may have been lost",
                            skipped
                        );
                    }
                    Err(SubscriptionError::Closed) => {
                        log_event!(warn, name, "Event bus closed, shutting down");
                        break;
                    }
                },
                _ = ticker.tick(), if pending => self.poll_once().await,
            }
        }

        log_event!(info, name, "Correlator stopped");
    }

    /// Handle an incoming event. Returns whether a new request is pending.
    async fn handle_event(&mut self, event: BridgeEvent) -> bool {
        let BridgeEvent::RequestTriggered {
            data,
            args,
            callback,
            ..
        } = event
        else {
            return false;
        };

        let slot = Arc::clone(&self.delivered);
        let on_response: ResponseHandler<TriggerArgs> =
            Box::new(move |response, (args, callback)| {
                if let Some(callback) = callback {
                    callback.call(response.clone(), args.clone());
                }
                *slot.lock() = Some(Delivery { response, args });
            });

        match self
            .correlator
            .issue_request(&data, (args, callback), on_response)
        {
            Ok(receipt) => {
                if let Some(previous) = receipt.superseded {
                    self.publish_abandoned(previous, AbandonReason::Superseded)
                        .await;
                }
                true
            }
            Err(e) => {
                self.bus
                    .publish(BridgeEvent::RequestFailed {
                        source: self.correlator.name().to_string(),
                        error: e.to_string(),
                    })
                    .await;
                false
            }
        }
    }

    /// Poll once and publish whatever the poll resolved.
    async fn poll_once(&mut self) {
        match self.correlator.poll() {
            PollOutcome::Delivered(id) => {
                let delivery = self.delivered.lock().take();
                if let Some(delivery) = delivery {
                    log_event!(
                        debug,
                        self.correlator.name(),
                        "Publishing response",
                        request_id = %id
                    );
                    self.bus
                        .publish(BridgeEvent::ResponseDelivered {
                            source: self.correlator.name().to_string(),
                            request_id: id.as_uuid(),
                            response: delivery.response,
                            args: delivery.args,
                        })
                        .await;
                }
            }
            PollOutcome::Abandoned { id, reason } => self.publish_abandoned(id, reason).await,
            PollOutcome::Idle | PollOutcome::Waiting(_) => {}
        }
    }

    async fn publish_abandoned(&mut self, id: RequestId, reason: AbandonReason) {
        log_event!(
            debug,
            self.correlator.name(),
            "Request abandoned",
            request_id = %id,
            reason = %reason
        );
        self.bus
            .publish(BridgeEvent::RequestAbandoned {
                source: self.correlator.name().to_string(),
                request_id: id.as_uuid(),
                reason,
            })
            .await;
    }
}
