//! # Bridge Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Host-supplied callback invoked with `(response, args)` when a response
/// arrives for the request it was triggered with.
///
/// Wrapped in an `Arc` so the event stays `Clone` for broadcast delivery;
/// the correlator still invokes it at most once per request.
#[derive(Clone)]
pub struct ResponseCallback(Arc<dyn Fn(serde_json::Value, serde_json::Value) + Send + Sync>);

impl ResponseCallback {
    /// Wrap a closure as a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(serde_json::Value, serde_json::Value) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, response: serde_json::Value, args: serde_json::Value) {
        (self.0)(response, args);
    }
}

impl fmt::Debug for ResponseCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseCallback(..)")
    }
}

/// Why a pending request was dropped without its callback being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
    /// No response arrived within the configured timeout.
    TimedOut,
    /// A newer request was issued by the same correlator.
    Superseded,
    /// The response file could not be decoded and the policy is to give up.
    MalformedResponse,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TimedOut => "timed_out",
            Self::Superseded => "superseded",
            Self::MalformedResponse => "malformed_response",
        };
        f.write_str(s)
    }
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// Start a request on the correlator named `target`.
    /// Source: Host | Target: Correlator
    RequestTriggered {
        /// Correlator name (subscription key).
        target: String,
        /// Request payload, written to `requests/<id>.json`.
        data: serde_json::Value,
        /// Opaque context handed back with the response.
        args: serde_json::Value,
        /// Optional direct callback.
        callback: Option<ResponseCallback>,
    },

    /// A response was read and the callback (if any) invoked.
    /// Source: Correlator | Target: Host
    ResponseDelivered {
        /// Correlator name.
        source: String,
        /// Id of the request this response answers.
        request_id: Uuid,
        /// Decoded response document.
        response: serde_json::Value,
        /// The args the request was triggered with.
        args: serde_json::Value,
    },

    /// A pending request was dropped without a callback.
    RequestAbandoned {
        /// Correlator name.
        source: String,
        /// Id of the abandoned request.
        request_id: Uuid,
        /// Why it was dropped.
        reason: AbandonReason,
    },

    /// A trigger could not be turned into a request file.
    RequestFailed {
        /// Correlator name.
        source: String,
        /// Error description.
        error: String,
    },
}

impl BridgeEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::RequestTriggered { .. } => EventTopic::Trigger,
            Self::ResponseDelivered { .. } => EventTopic::Response,
            Self::RequestAbandoned { .. } | Self::RequestFailed { .. } => EventTopic::Lifecycle,
        }
    }

    /// Name of the correlator this event is addressed to or originates from.
    #[must_use]
    pub fn correlator(&self) -> &str {
        match self {
            Self::RequestTriggered { target, .. } => target,
            Self::ResponseDelivered { source, .. }
            | Self::RequestAbandoned { source, .. }
            | Self::RequestFailed { source, .. } => source,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Host-to-correlator request triggers.
    Trigger,
    /// Delivered responses.
    Response,
    /// Abandonments and failures.
    Lifecycle,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Correlator names to include. Empty means all correlators.
    pub correlators: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            correlators: Vec::new(),
        }
    }

    /// The subscription a correlator named `name` listens on: triggers
    /// addressed to it and nothing else.
    #[must_use]
    pub fn for_correlator(name: &str) -> Self {
        Self {
            topics: vec![EventTopic::Trigger],
            correlators: vec![name.to_string()],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BridgeEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let correlator_match = self.correlators.is_empty()
            || self.correlators.iter().any(|c| c == event.correlator());

        topic_match && correlator_match
    }
}
