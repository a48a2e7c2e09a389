//! # Bridge Correlator
//!
//! Request/response correlation over a shared directory. A requester drops a
//! JSON request file for the external launcher, then polls for the matching
//! response file until it arrives or the request times out.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure correlation logic, no I/O
//!   - `RequestId`: Request identifier and file naming
//!   - `ResponseTimeout`: Clamped response window
//!   - `CorrelatorState`: `Idle` / `AwaitingResponse`
//!   - `CorrelatorConfig` and `CorrelatorConfigBuilder`
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `CorrelatorApi`: Driving port (inbound API)
//!   - `RequestExchange`, `Clock`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `RequestCorrelator`: Implements `CorrelatorApi`
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `DirectoryExchange`: `requests/` and `responses/` under the save root
//!   - `InMemoryExchange`: Shared in-memory exchange
//!   - `CorrelatorBusAdapter`: Event bus subscriber and poll ticker
//!
//! ## Invariants
//!
//! - At most one request is pending per correlator. Issuing a new one
//!   supersedes the old one, whose callback never runs.
//! - A callback runs at most once, and only with the response whose file
//!   name matches the pending request id.
//! - The effective timeout always lies in `[1, 59]` seconds.
//!
//! ## Usage Example
//!
//! ```ignore
//! use bridge_correlator::{
//!     CorrelatorApi, CorrelatorConfig, DirectoryExchange, RequestCorrelator, SystemClock,
//! };
//!
//! let exchange = DirectoryExchange::new("/path/to/save");
//! exchange.ensure_layout()?;
//!
//! let config = CorrelatorConfig::new("highscores", 10.0)?;
//! let mut correlator = RequestCorrelator::new(config, exchange, SystemClock);
//!
//! correlator.issue_request(
//!     &serde_json::json!({"chart": "hard"}),
//!     serde_json::json!({"row": 3}),
//!     Box::new(|response, args| println!("{response} for {args}")),
//! )?;
//!
//! // Every 500ms while pending
//! correlator.poll();
//! ```
//!
//! ## Wiring to Runtime
//!
//! ```ignore
//! use bridge_correlator::{CorrelatorBusAdapter, RequestCorrelator, TokioClock};
//! use shared_bus::InMemoryEventBus;
//! use std::sync::Arc;
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let correlator = RequestCorrelator::new(config, exchange, TokioClock);
//! let adapter = CorrelatorBusAdapter::new(bus.clone(), correlator);
//!
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! tokio::spawn(adapter.run(shutdown_rx));
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    CorrelatorBusAdapter, DirectoryExchange, InMemoryExchange, ManualClock, SystemClock,
    TokioClock, TriggerArgs, REQUESTS_DIR, RESPONSES_DIR,
};
pub use domain::{
    clamp_timeout_secs, validate_name, CorrelatorConfig, CorrelatorConfigBuilder,
    CorrelatorState, IssueReceipt, MalformedResponsePolicy, PendingRequest, PollOutcome,
    RequestId, ResponseHandler, ResponseTimeout, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT_SECS,
    MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS, RESPONSE_RETENTION_SECS,
};
pub use error::{ConfigError, CorrelatorError, ExchangeError};
pub use metrics::{CorrelatorMetrics, MetricsSnapshot};
pub use ports::{Clock, CorrelatorApi, RequestExchange};
pub use service::RequestCorrelator;
