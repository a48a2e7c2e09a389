//! Bridge runtime: input loop, outcome reporting and shutdown.
//!
//! ## Lifecycle
//!
//! 1. Register correlators (one bus adapter task each)
//! 2. Read trigger lines and publish them on the bus
//! 3. Write every outcome event as an output line
//! 4. On end of input, keep reporting until every published trigger has an
//!    outcome, then stop
//! 5. On the shutdown signal, stop immediately
//!
//! Each published trigger ends in exactly one outcome: delivered, abandoned
//! (timed out, superseded or malformed) or failed.
//!
//! Input is read only while fewer than [`InMemoryEventBus::in_flight_limit`]
//! triggers are unresolved. A burst of input then waits for outcomes instead
//! of overrunning the bus buffer.

use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bridge_correlator::{CorrelatorConfig, MetricsSnapshot, RequestExchange};
use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, SubscriptionError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::protocol::{OutputLine, TriggerLine};
use crate::registry::{CorrelatorRegistry, RegistryError};

/// The running bridge.
pub struct BridgeRuntime<E>
where
    E: RequestExchange + Clone + 'static,
{
    bus: Arc<InMemoryEventBus>,
    registry: CorrelatorRegistry<E>,
}

impl<E> BridgeRuntime<E>
where
    E: RequestExchange + Clone + 'static,
{
    pub fn new(bus: Arc<InMemoryEventBus>, exchange: E) -> Self {
        let registry = CorrelatorRegistry::new(Arc::clone(&bus), exchange);
        Self { bus, registry }
    }

    /// Register a correlator. Must be called from within a tokio runtime.
    pub fn register(&self, config: CorrelatorConfig) -> Result<(), RegistryError> {
        self.registry.register(config)
    }

    pub fn registry(&self) -> &CorrelatorRegistry<E> {
        &self.registry
    }

    /// Serve `input` until it ends and every trigger has an outcome, or
    /// until `shutdown` resolves.
    ///
    /// Returns the final metrics of every correlator.
    pub async fn run<R, W, S>(
        self,
        input: R,
        mut output: W,
        shutdown: S,
    ) -> Result<Vec<(String, MetricsSnapshot)>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let mut outcomes = self.bus.subscribe(EventFilter::topics(vec![
            EventTopic::Response,
            EventTopic::Lifecycle,
        ]));
        let mut lines = input.lines();
        let mut input_open = true;
        // Published triggers still waiting for their outcome
        let mut outstanding: usize = 0;
        let in_flight_limit = self.bus.in_flight_limit();
        tokio::pin!(shutdown);

        info!(
            correlators = ?self.registry.names(),
            in_flight_limit,
            "Bridge runtime started"
        );

        loop {
            if !input_open && outstanding == 0 {
                info!("Input closed and all requests resolved");
                break;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!(outstanding, "Shutdown requested");
                    break;
                }
                line = lines.next_line(), if input_open && outstanding < in_flight_limit => {
                    match line.context("Failed to read input")? {
                        Some(line) if line.trim().is_empty() => {}
                        Some(line) => match self.handle_line(line.trim()).await {
                            Ok(()) => outstanding += 1,
                            Err(rejected) => write_line(&mut output, &rejected).await?,
                        },
                        None => {
                            debug!(outstanding, "Input closed, waiting for outstanding requests");
                            input_open = false;
                        }
                    }
                }
                event = outcomes.recv() => match event {
                    Ok(event) => {
                        if let Some(line) = OutputLine::from_event(&event) {
                            outstanding = outstanding.saturating_sub(1);
                            write_line(&mut output, &line).await?;
                        }
                    }
                    Err(SubscriptionError::Lagged(skipped)) => {
                        // Lost outcomes can no longer be matched to triggers
                        bail!("Outcome stream fell behind, {skipped} bus events lost");
                    }
                    Err(SubscriptionError::Closed) => {
                        warn!("Event bus closed");
                        break;
                    }
                },
            }
        }

        let snapshots = self.registry.shutdown().await;
        for (name, snapshot) in &snapshots {
            info!(
                correlator = %name,
                issued = snapshot.requests_issued,
                delivered = snapshot.responses_delivered,
                timed_out = snapshot.requests_timed_out,
                superseded = snapshot.requests_superseded,
                malformed = snapshot.malformed_responses,
                write_failures = snapshot.write_failures,
                polls = snapshot.polls,
                bus_events_skipped = snapshot.bus_events_skipped,
                "Correlator stats"
            );
        }
        Ok(snapshots)
    }

    /// Publish one non-blank input line, or return the rejection to report
    /// when it cannot reach a correlator.
    async fn handle_line(&self, line: &str) -> Result<(), OutputLine> {
        let trigger = TriggerLine::parse(line).map_err(|e| {
            warn!(error = %e, "Rejected input line");
            OutputLine::rejected(e.to_string())
        })?;

        if !self.registry.contains(&trigger.target) {
            warn!(target_name = %trigger.target, "Trigger for unknown correlator");
            return Err(OutputLine::rejected(format!(
                "Unknown correlator '{}'",
                trigger.target
            )));
        }

        debug!(correlator = %trigger.target, "Publishing trigger");
        self.bus.publish(trigger.into_event()).await;
        Ok(())
    }
}

async fn write_line<W>(output: &mut W, line: &OutputLine) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = line.to_json_line().context("Failed to encode output line")?;
    output
        .write_all(json.as_bytes())
        .await
        .context("Failed to write output")?;
    output.flush().await.context("Failed to flush output")?;
    Ok(())
}
