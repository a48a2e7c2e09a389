//! Command line arguments

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bridge_correlator::{
    validate_name, ConfigError, CorrelatorConfig, CorrelatorConfigBuilder,
    MalformedResponsePolicy, DEFAULT_TIMEOUT_SECS,
};
use clap::Parser;
use thiserror::Error;

/// Launcher bridge: correlates request files with launcher responses.
#[derive(Debug, Parser)]
#[command(name = "bridge-runtime", version, about)]
pub struct Args {
    /// Save-data root holding `requests/` and `responses/`
    #[arg(long, env = "LB_SAVE_ROOT")]
    pub save_root: PathBuf,

    /// Correlator to run, as NAME or NAME=TIMEOUT_SECS (repeatable)
    #[arg(long = "correlator", value_name = "NAME[=TIMEOUT_SECS]", required = true)]
    pub correlators: Vec<CorrelatorSpec>,

    /// Delay between polls of a pending response, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// What to do with a response file that is not valid JSON
    #[arg(long, default_value_t = MalformedResponsePolicy::Retry)]
    pub malformed_policy: MalformedResponsePolicy,

    /// Delete response files once delivered
    #[arg(long)]
    pub remove_consumed: bool,
}

impl Args {
    /// One validated configuration per `--correlator`, sharing the global
    /// polling options.
    pub fn correlator_configs(&self) -> Result<Vec<CorrelatorConfig>, ConfigError> {
        self.correlators
            .iter()
            .map(|spec| {
                CorrelatorConfigBuilder::new(spec.name.clone())
                    .timeout_secs(spec.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
                    .poll_interval(Duration::from_millis(self.poll_interval_ms))
                    .malformed_policy(self.malformed_policy)
                    .remove_consumed_responses(self.remove_consumed)
                    .build()
            })
            .collect()
    }
}

/// Errors parsing a `--correlator` value.
#[derive(Debug, Error)]
pub enum CorrelatorSpecError {
    #[error(transparent)]
    Name(#[from] ConfigError),

    #[error("Invalid timeout '{0}', expected seconds")]
    Timeout(String),
}

/// A `NAME[=TIMEOUT_SECS]` argument.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatorSpec {
    pub name: String,
    pub timeout_secs: Option<f64>,
}

impl FromStr for CorrelatorSpec {
    type Err = CorrelatorSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, timeout) = match s.split_once('=') {
            Some((name, timeout)) => (name, Some(timeout)),
            None => (s, None),
        };
        validate_name(name)?;

        let timeout_secs = timeout
            .map(|t| {
                t.trim()
                    .parse::<f64>()
                    .map_err(|_| CorrelatorSpecError::Timeout(t.to_string()))
            })
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            timeout_secs,
        })
    }
}
