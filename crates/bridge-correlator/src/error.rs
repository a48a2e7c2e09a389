//! Error types for the request correlator

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned when issuing a request
#[derive(Debug, Error)]
pub enum CorrelatorError {
    #[error("Failed to serialize request payload: {0}")]
    Serialization(String),

    #[error("Failed to write request file: {0}")]
    Exchange(#[from] ExchangeError),
}

/// Errors from the request/response exchange
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Exchange unavailable: {0}")]
    Unavailable(String),
}

impl ExchangeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from correlator configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Correlator name cannot be empty")]
    EmptyName,

    #[error("Invalid correlator name {name:?}: only ASCII letters, digits, '_', '-' and '.' are allowed")]
    InvalidName { name: String },

    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("Unknown malformed-response policy: {0} (expected \"retry\" or \"abandon\")")]
    UnknownMalformedPolicy(String),
}
