use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },
    #[error("{field} must not exceed {max_secs}s")]
    TooLarge { field: &'static str, max_secs: u64 },
}

/// Upper bound for every configured duration; far-future deadlines overflow `Instant`.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Timing configuration for a monitor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Page loads slower than this raise a soft timeout alert (default: 5s).
    pub timeout_threshold: Duration,
    /// Period between poll cycles (default: 60s).
    pub interval: Duration,
    /// Hard cap on a single navigation before it is aborted (default: 20s).
    pub navigation_timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_threshold: Duration::from_secs(5),
            interval: Duration::from_secs(60),
            navigation_timeout: Duration::from_secs(20),
        }
    }
}

impl PollingConfig {
    pub fn with_timeout_threshold(mut self, threshold: Duration) -> Self {
        self.timeout_threshold = threshold;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("timeout_threshold", self.timeout_threshold)?;
        check_duration("interval", self.interval)?;
        check_duration("navigation_timeout", self.navigation_timeout)?;
        Ok(())
    }
}

fn check_duration(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::NonPositive { field });
    }
    if value > MAX_DURATION {
        return Err(ConfigError::TooLarge {
            field,
            max_secs: MAX_DURATION.as_secs(),
        });
    }
    Ok(())
}
