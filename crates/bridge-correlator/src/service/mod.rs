//! Service Layer
//!
//! - `RequestCorrelator`: implements `CorrelatorApi`

pub mod correlator;

pub use correlator::RequestCorrelator;
