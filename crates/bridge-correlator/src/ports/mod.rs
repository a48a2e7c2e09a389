//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API the host drives the correlator through
//! - Driven Ports (outbound) - Clock and request/response exchange

pub mod inbound;
pub mod outbound;

pub use inbound::CorrelatorApi;
pub use outbound::{Clock, RequestExchange};
