//! # Shared Bus - Event Bus between the Host and the Correlators
//!
//! The host never calls a correlator directly. It publishes a
//! `BridgeEvent::RequestTriggered` addressed to a correlator name, and each
//! correlator listens on a subscription scoped to its own name.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────┐
//! │  Host / UI   │                    │ RequestCorrelator│
//! │              │    publish()       │  (name-scoped)   │
//! │              │ ──────┐            │                  │
//! └──────────────┘       │            └──────────────────┘
//!        ↑               ▼                    ↑      │
//!        │         ┌──────────────┐           │      │
//!        │         │  Event Bus   │ ──────────┘      │
//!        └──────── │              │ ◄────────────────┘
//!     subscribe()  └──────────────┘  ResponseDelivered /
//!                                    RequestAbandoned / RequestFailed
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{AbandonReason, BridgeEvent, EventFilter, EventTopic, ResponseCallback};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Unread events buffered per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
