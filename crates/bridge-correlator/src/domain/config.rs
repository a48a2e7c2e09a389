//! Correlator configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use bridge_correlator::domain::CorrelatorConfigBuilder;
//!
//! let config = CorrelatorConfigBuilder::new("scores")
//!     .timeout_secs(10.0)
//!     .build()
//!     .expect("Valid config");
//! ```

use std::time::Duration;

use crate::domain::{MalformedResponsePolicy, ResponseTimeout};
use crate::error::ConfigError;

/// Fixed delay between two polls of the response file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Correlator configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrelatorConfig {
    /// Subscription key on the bus; unique per process.
    pub name: String,
    /// How long to wait for a response (already clamped).
    pub timeout: ResponseTimeout,
    /// Delay between polls while a request is pending.
    pub poll_interval: Duration,
    /// What to do with a response file that does not decode.
    pub malformed_policy: MalformedResponsePolicy,
    /// Delete the response file after it was delivered. The launcher
    /// expires response files on its own, so this is off by default.
    pub remove_consumed_responses: bool,
}

impl CorrelatorConfig {
    /// Create a configuration with default polling behavior.
    ///
    /// `timeout_secs` is clamped to `[1.0, 59.0]`; it never causes an error.
    pub fn new(name: impl Into<String>, timeout_secs: f64) -> Result<Self, ConfigError> {
        CorrelatorConfigBuilder::new(name)
            .timeout_secs(timeout_secs)
            .build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }

        Ok(())
    }
}

/// Check that a correlator name is usable as a subscription key.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName);
    }

    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(ConfigError::InvalidName {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Builder for CorrelatorConfig with validation
#[derive(Debug)]
pub struct CorrelatorConfigBuilder {
    name: String,
    timeout: Option<ResponseTimeout>,
    poll_interval: Option<Duration>,
    malformed_policy: Option<MalformedResponsePolicy>,
    remove_consumed_responses: bool,
}

impl CorrelatorConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: None,
            poll_interval: None,
            malformed_policy: None,
            remove_consumed_responses: false,
        }
    }

    /// Set the response timeout in seconds (clamped to `[1.0, 59.0]`)
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = Some(ResponseTimeout::from_secs_f64(secs));
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn malformed_policy(mut self, policy: MalformedResponsePolicy) -> Self {
        self.malformed_policy = Some(policy);
        self
    }

    pub fn remove_consumed_responses(mut self, remove: bool) -> Self {
        self.remove_consumed_responses = remove;
        self
    }

    /// Build the CorrelatorConfig, validating all parameters
    pub fn build(self) -> Result<CorrelatorConfig, ConfigError> {
        let config = CorrelatorConfig {
            name: self.name,
            timeout: self.timeout.unwrap_or_default(),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            malformed_policy: self.malformed_policy.unwrap_or_default(),
            remove_consumed_responses: self.remove_consumed_responses,
        };

        config.validate()?;
        Ok(config)
    }
}
