//! Response timeout
//!
//! The launcher deletes response files older than
//! [`RESPONSE_RETENTION_SECS`]. A correlator must stop waiting strictly
//! before that, so the configured timeout is clamped to
//! `[MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS]`.

use std::time::Duration;

/// Lower bound for a response timeout, in seconds.
pub const MIN_TIMEOUT_SECS: f64 = 1.0;

/// Upper bound for a response timeout, in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 59.0;

/// How long the launcher keeps response files around.
pub const RESPONSE_RETENTION_SECS: u64 = 60;

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Clamp a timeout in seconds to `[1.0, 59.0]`. NaN becomes the minimum.
#[must_use]
pub fn clamp_timeout_secs(secs: f64) -> f64 {
    if secs.is_nan() {
        return MIN_TIMEOUT_SECS;
    }
    secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
}

/// A response timeout, always within the clamped range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseTimeout(Duration);

impl ResponseTimeout {
    /// Build a timeout from seconds, clamping silently.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::from_secs_f64(clamp_timeout_secs(secs)))
    }

    /// The timeout as a `Duration`.
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Whether a request that has been pending for `elapsed` has expired.
    #[must_use]
    pub fn is_expired(&self, elapsed: Duration) -> bool {
        elapsed >= self.0
    }
}

impl Default for ResponseTimeout {
    fn default() -> Self {
        Self::from_secs_f64(DEFAULT_TIMEOUT_SECS)
    }
}
