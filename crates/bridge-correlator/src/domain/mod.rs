//! Domain Layer - Pure correlation logic
//!
//! This layer contains:
//! - Request identifiers and their file naming
//! - Timeout clamping
//! - Correlator configuration
//! - The correlator state machine types
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod config;
pub mod request_id;
pub mod state;
pub mod timeout;

pub use config::{
    validate_name, CorrelatorConfig, CorrelatorConfigBuilder, DEFAULT_POLL_INTERVAL,
};
pub use request_id::RequestId;
pub use state::{
    CorrelatorState, IssueReceipt, MalformedResponsePolicy, PendingRequest, PollOutcome,
    ResponseHandler,
};
pub use timeout::{
    clamp_timeout_secs, ResponseTimeout, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
    RESPONSE_RETENTION_SECS,
};
