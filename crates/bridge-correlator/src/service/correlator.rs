//! Request correlator service
//!
//! Drives one [`CorrelatorState`] against injected exchange and clock ports.
//! Everything here is synchronous: a poll is a single non-blocking read of
//! the response file and always runs to completion.

use bridge_telemetry::log_event;
use serde::Serialize;
use shared_bus::AbandonReason;
use std::sync::Arc;

use crate::domain::{
    CorrelatorConfig, CorrelatorState, IssueReceipt, MalformedResponsePolicy, PendingRequest,
    PollOutcome, RequestId, ResponseHandler,
};
use crate::error::CorrelatorError;
use crate::metrics::CorrelatorMetrics;
use crate::ports::{Clock, CorrelatorApi, RequestExchange};

/// Correlates request files with response files for one named requester.
pub struct RequestCorrelator<E, C, A = serde_json::Value>
where
    E: RequestExchange,
    C: Clock,
{
    config: CorrelatorConfig,
    exchange: E,
    clock: C,
    state: CorrelatorState<A>,
    metrics: Arc<CorrelatorMetrics>,
}

impl<E, C, A> RequestCorrelator<E, C, A>
where
    E: RequestExchange,
    C: Clock,
{
    pub fn new(config: CorrelatorConfig, exchange: E, clock: C) -> Self {
        Self {
            config,
            exchange,
            clock,
            state: CorrelatorState::Idle,
            metrics: Arc::new(CorrelatorMetrics::new()),
        }
    }

    pub fn config(&self) -> &CorrelatorConfig {
        &self.config
    }

    /// Shared handle to this correlator's counters.
    pub fn metrics(&self) -> Arc<CorrelatorMetrics> {
        self.metrics.clone()
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Take the pending request and run its callback.
    fn deliver(&mut self, response: serde_json::Value) -> PollOutcome {
        let CorrelatorState::AwaitingResponse(pending) =
            std::mem::replace(&mut self.state, CorrelatorState::Idle)
        else {
            return PollOutcome::Idle;
        };

        let id = pending.id;
        pending.resolve(response);
        self.metrics.record_delivered();
        log_event!(debug, self.config.name, "Response delivered", request_id = %id);

        if self.config.remove_consumed_responses {
            if let Err(e) = self.exchange.remove_response(&id) {
                log_event!(
                    warn,
                    self.config.name,
                    "Failed to remove consumed response",
                    request_id = %id,
                    error = %e
                );
            }
        }

        PollOutcome::Delivered(id)
    }

    fn abandon(&mut self, id: RequestId, reason: AbandonReason) -> PollOutcome {
        // Dropping the pending request drops its callback uncalled
        self.state = CorrelatorState::Idle;
        PollOutcome::Abandoned { id, reason }
    }
}

impl<E, C, A> CorrelatorApi<A> for RequestCorrelator<E, C, A>
where
    E: RequestExchange,
    C: Clock,
{
    fn issue_request<D>(
        &mut self,
        data: &D,
        args: A,
        on_response: ResponseHandler<A>,
    ) -> Result<IssueReceipt, CorrelatorError>
    where
        D: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(data).map_err(|e| {
            self.metrics.record_write_failure();
            CorrelatorError::Serialization(e.to_string())
        })?;

        let id = RequestId::generate();
        if let Err(e) = self.exchange.write_request(&id, &payload) {
            self.metrics.record_write_failure();
            log_event!(
                warn,
                self.config.name,
                "Failed to write request",
                request_id = %id,
                error = %e
            );
            return Err(e.into());
        }

        let pending = PendingRequest::new(id, self.clock.now(), args, on_response);
        let superseded = match std::mem::replace(
            &mut self.state,
            CorrelatorState::AwaitingResponse(pending),
        ) {
            CorrelatorState::AwaitingResponse(previous) => {
                self.metrics.record_superseded();
                log_event!(
                    debug,
                    self.config.name,
                    "Pending request superseded",
                    request_id = %previous.id,
                    superseded_by = %id
                );
                Some(previous.id)
            }
            CorrelatorState::Idle => None,
        };

        self.metrics.record_issued();
        log_event!(
            debug,
            self.config.name,
            "Request issued",
            request_id = %id,
            bytes = payload.len()
        );

        Ok(IssueReceipt { id, superseded })
    }

    fn poll(&mut self) -> PollOutcome {
        let (id, elapsed) = match &self.state {
            CorrelatorState::Idle => return PollOutcome::Idle,
            CorrelatorState::AwaitingResponse(pending) => {
                (pending.id, pending.elapsed(self.clock.now()))
            }
        };
        self.metrics.record_poll();

        match self.exchange.read_response(&id) {
            Ok(Some(bytes)) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(response) => return self.deliver(response),
                Err(e) => {
                    self.metrics.record_malformed();
                    match self.config.malformed_policy {
                        MalformedResponsePolicy::Retry => {
                            log_event!(
                                debug,
                                self.config.name,
                                "Response not decodable yet, retrying on next poll",
                                request_id = %id,
                                error = %e
                            );
                        }
                        MalformedResponsePolicy::Abandon => {
                            log_event!(
                                warn,
                                self.config.name,
                                "Malformed response, abandoning request",
                                request_id = %id,
                                error = %e
                            );
                            self.metrics.record_malformed_abandoned();
                            return self.abandon(id, AbandonReason::MalformedResponse);
                        }
                    }
                }
            },
            Ok(None) => {}
            Err(e) => {
                log_event!(
                    warn,
                    self.config.name,
                    "Failed to read response, treating as not yet written",
                    request_id = %id,
                    error = %e
                );
            }
        }

        if self.config.timeout.is_expired(elapsed) {
            self.metrics.record_timed_out();
            log_event!(
                debug,
                self.config.name,
                "Request timed out",
                request_id = %id,
                elapsed_ms = elapsed.as_millis() as u64
            );
            return self.abandon(id, AbandonReason::TimedOut);
        }

        PollOutcome::Waiting(id)
    }

    fn is_pending(&self) -> bool {
        !self.state.is_idle()
    }

    fn pending_id(&self) -> Option<RequestId> {
        self.state.pending_id()
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
