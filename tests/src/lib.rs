//! # Launcher Bridge Test Suite
//!
//! Cross-crate flows against a real save-data directory, with a simulated
//! launcher answering request files.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── launcher.rs   # Simulated launcher and event helpers
//!     └── flows.rs      # Trigger → request file → response file → outcome
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bridge-tests
//! cargo test -p bridge-tests integration::flows::
//! ```

pub mod integration;
