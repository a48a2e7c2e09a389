//! Inbound Ports (Driving Ports)
//!
//! The API a host (or the bus adapter) uses to drive a correlator.

use serde::Serialize;

use crate::domain::{IssueReceipt, PollOutcome, RequestId, ResponseHandler};
use crate::error::CorrelatorError;

/// Primary correlator API (Driving Port)
///
/// `A` is the opaque context handed back to the callback.
pub trait CorrelatorApi<A> {
    /// Write a new request and make it the pending one.
    ///
    /// Any previously pending request is superseded: its callback is dropped
    /// and its response, if it ever arrives, is ignored. On error nothing
    /// changes, including the previously pending request.
    fn issue_request<D>(
        &mut self,
        data: &D,
        args: A,
        on_response: ResponseHandler<A>,
    ) -> Result<IssueReceipt, CorrelatorError>
    where
        D: Serialize + ?Sized;

    /// Check once for the pending request's response or timeout.
    ///
    /// A no-op returning `PollOutcome::Idle` when nothing is pending.
    fn poll(&mut self) -> PollOutcome;

    /// Whether a request is pending.
    fn is_pending(&self) -> bool;

    /// Id of the pending request, if any.
    fn pending_id(&self) -> Option<RequestId>;

    /// Correlator name (bus subscription key).
    fn name(&self) -> &str;
}
