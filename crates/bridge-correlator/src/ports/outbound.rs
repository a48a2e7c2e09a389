//! Outbound Ports (Driven Ports)
//!
//! Capabilities the correlator needs from its environment. Injected so the
//! state machine can be exercised without a real filesystem or wall clock.

use std::time::Instant;

use crate::domain::RequestId;
use crate::error::ExchangeError;

/// Monotonic time source (Driven Port)
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Request/response exchange shared with the launcher (Driven Port)
///
/// Both sides address files by request id only. Every call is made from
/// inside a poll and should return promptly.
pub trait RequestExchange: Send + Sync {
    /// Publish a request payload under `id`. Must be all-or-nothing from the
    /// launcher's point of view.
    fn write_request(&self, id: &RequestId, payload: &[u8]) -> Result<(), ExchangeError>;

    /// Read the response for `id`. `Ok(None)` when it has not been written.
    fn read_response(&self, id: &RequestId) -> Result<Option<Vec<u8>>, ExchangeError>;

    /// Delete the response for `id`. Deleting a missing response is not an error.
    fn remove_response(&self, id: &RequestId) -> Result<(), ExchangeError>;
}
