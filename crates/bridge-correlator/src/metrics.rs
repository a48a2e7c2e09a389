//! Counters for correlator activity
//!
//! ## Usage
//!
//! ```ignore
//! let correlator = RequestCorrelator::new(config, exchange, SystemClock);
//! let metrics = correlator.metrics();
//!
//! // ... later
//! let snapshot = metrics.snapshot();
//! tracing::info!(delivered = snapshot.responses_delivered, "Correlator stats");
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one correlator.
#[derive(Debug, Default)]
pub struct CorrelatorMetrics {
    /// Request files successfully written
    pub requests_issued: AtomicU64,
    /// Responses read and handed to a callback
    pub responses_delivered: AtomicU64,
    /// Requests dropped because the timeout elapsed
    pub requests_timed_out: AtomicU64,
    /// Requests replaced by a newer one before resolving
    pub requests_superseded: AtomicU64,
    /// Response files that failed to decode
    pub malformed_responses: AtomicU64,
    /// Requests dropped because their response failed to decode
    pub malformed_abandoned: AtomicU64,
    /// Requests that could not be serialized or written
    pub write_failures: AtomicU64,
    /// Polls performed while a request was pending
    pub polls: AtomicU64,
    /// Bus events skipped because the trigger subscription fell behind
    pub bus_events_skipped: AtomicU64,
}

impl CorrelatorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_issued(&self) {
        self.requests_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.responses_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timed_out(&self) {
        self.requests_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded(&self) {
        self.requests_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_abandoned(&self) {
        self.malformed_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bus_lag(&self, skipped: u64) {
        self.bus_events_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            responses_delivered: self.responses_delivered.load(Ordering::Relaxed),
            requests_timed_out: self.requests_timed_out.load(Ordering::Relaxed),
            requests_superseded: self.requests_superseded.load(Ordering::Relaxed),
            malformed_responses: self.malformed_responses.load(Ordering::Relaxed),
            malformed_abandoned: self.malformed_abandoned.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
            bus_events_skipped: self.bus_events_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CorrelatorMetrics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_issued: u64,
    pub responses_delivered: u64,
    pub requests_timed_out: u64,
    pub requests_superseded: u64,
    pub malformed_responses: u64,
    pub malformed_abandoned: u64,
    pub write_failures: u64,
    pub polls: u64,
    pub bus_events_skipped: u64,
}

impl MetricsSnapshot {
    /// Requests issued and not yet delivered or abandoned. Zero or one for a
    /// single correlator.
    pub fn in_flight(&self) -> u64 {
        self.requests_issued.saturating_sub(
            self.responses_delivered
                + self.requests_timed_out
                + self.requests_superseded
                + self.malformed_abandoned,
        )
    }
}
