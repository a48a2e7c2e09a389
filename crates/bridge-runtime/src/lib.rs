//! # Bridge Runtime Library
//!
//! Wiring for the `bridge-runtime` binary, exposed for testing.
//!
//! ## Modules
//!
//! - `cli` - Command line arguments and per-correlator configuration
//! - `registry` - One bus adapter task per named correlator
//! - `protocol` - JSON-lines triggers in, outcomes out
//! - `runtime` - Input loop, outcome reporting and shutdown
//!
//! ## Flow
//!
//! ```text
//! stdin ──TriggerLine──→ RequestTriggered ──→ Event Bus ──→ CorrelatorBusAdapter
//!                                                                 │
//!                                                    requests/<id>.json
//!                                                                 │
//!                                                            (launcher)
//!                                                                 │
//!                                                    responses/<id>.json
//!                                                                 │
//! stdout ←──OutputLine──── ResponseDelivered / RequestAbandoned ←─┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod cli;
pub mod protocol;
pub mod registry;
pub mod runtime;

pub use cli::{Args, CorrelatorSpec, CorrelatorSpecError};
pub use protocol::{OutputLine, ProtocolError, TriggerLine};
pub use registry::{CorrelatorRegistry, RegistryError};
pub use runtime::BridgeRuntime;
