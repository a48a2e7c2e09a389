//! Correlator state machine types
//!
//! ```text
//! Idle --issue(ok)--> AwaitingResponse
//! Idle --issue(err)--> Idle
//! AwaitingResponse --issue(ok)--> AwaitingResponse(new id)   (supersession)
//! AwaitingResponse --response read--> Idle                   (callback invoked)
//! AwaitingResponse --timeout--> Idle                         (callback dropped)
//! ```

use serde::{Deserialize, Serialize};
use shared_bus::AbandonReason;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::domain::RequestId;
use crate::error::ConfigError;

/// Callback invoked with `(response, args)` once a response arrives.
pub type ResponseHandler<A> = Box<dyn FnOnce(serde_json::Value, A) + Send>;

/// The single in-flight request of a correlator.
pub struct PendingRequest<A> {
    /// Request id, also the response file stem.
    pub id: RequestId,
    /// When the request file was written.
    pub issued_at: Instant,
    /// Opaque context handed back to the callback.
    pub args: A,
    callback: ResponseHandler<A>,
}

impl<A> PendingRequest<A> {
    pub fn new(id: RequestId, issued_at: Instant, args: A, callback: ResponseHandler<A>) -> Self {
        Self {
            id,
            issued_at,
            args,
            callback,
        }
    }

    /// Time since the request was issued.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.issued_at)
    }

    /// Consume the request, invoking its callback.
    pub fn resolve(self, response: serde_json::Value) {
        (self.callback)(response, self.args);
    }
}

impl<A> fmt::Debug for PendingRequest<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// Correlator state. At most one request is ever pending.
#[derive(Debug, Default)]
pub enum CorrelatorState<A> {
    #[default]
    Idle,
    AwaitingResponse(PendingRequest<A>),
}

impl<A> CorrelatorState<A> {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Id of the pending request, if any.
    #[must_use]
    pub fn pending_id(&self) -> Option<RequestId> {
        match self {
            Self::Idle => None,
            Self::AwaitingResponse(pending) => Some(pending.id),
        }
    }
}

/// Result of a successful `issue_request`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssueReceipt {
    /// Id of the newly pending request.
    pub id: RequestId,
    /// Id of the request this one replaced, if one was pending.
    pub superseded: Option<RequestId>,
}

/// What a single `poll` observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing pending.
    Idle,
    /// Still waiting for this request.
    Waiting(RequestId),
    /// The response arrived and the callback ran.
    Delivered(RequestId),
    /// The request was dropped without invoking the callback.
    Abandoned {
        id: RequestId,
        reason: AbandonReason,
    },
}

/// How to treat a response file that exists but does not decode as JSON.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedResponsePolicy {
    /// Treat it as not yet written (the launcher may still be writing it)
    /// and look again on the next poll. The timeout still applies.
    #[default]
    Retry,
    /// Give up on the request immediately.
    Abandon,
}

impl FromStr for MalformedResponsePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "retry" => Ok(Self::Retry),
            "abandon" => Ok(Self::Abandon),
            other => Err(ConfigError::UnknownMalformedPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for MalformedResponsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => f.write_str("retry"),
            Self::Abandon => f.write_str("abandon"),
        }
    }
}
