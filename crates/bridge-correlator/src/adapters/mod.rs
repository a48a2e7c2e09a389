//! Adapters Layer (Driven and Driving Adapters)
//!
//! ## Adapters
//!
//! - `DirectoryExchange` - Request/response files under the save-data root
//! - `InMemoryExchange` - Shared in-memory exchange for tests and embedding
//! - `SystemClock`, `TokioClock`, `ManualClock` - Time sources
//! - `CorrelatorBusAdapter` - Subscribes to triggers and drives the poll ticker

pub mod bus_adapter;
pub mod clock;
pub mod directory;
pub mod in_memory;

pub use bus_adapter::{CorrelatorBusAdapter, TriggerArgs};
pub use clock::{ManualClock, SystemClock, TokioClock};
pub use directory::{DirectoryExchange, REQUESTS_DIR, RESPONSES_DIR};
pub use in_memory::InMemoryExchange;
