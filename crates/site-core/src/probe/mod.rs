mod browser;
mod chrome;

pub use browser::BrowserProbe;
pub use chrome::ChromeLauncher;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chromium network error codes that mean the host could not be reached at all.
const UNREACHABLE_ERRORS: &[&str] = &[
    "net::ERR_NAME_NOT_RESOLVED",
    "net::ERR_NAME_RESOLUTION_FAILED",
    "net::ERR_ADDRESS_UNREACHABLE",
    "net::ERR_INTERNET_DISCONNECTED",
    "net::ERR_CONNECTION_REFUSED",
    "net::ERR_CONNECTION_RESET",
];

const TIMEOUT_ERRORS: &[&str] = &["net::ERR_TIMED_OUT", "net::ERR_CONNECTION_TIMED_OUT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Unreachable,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Outcome of a single page load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Success { duration: Duration },
    Failure { kind: FailureKind, detail: String },
}

impl ProbeResult {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Failed to open page: {0}")]
    Page(String),
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Navigation to {url} timed out")]
    Timeout { url: String },
    #[error("Failed to close {resource}: {reason}")]
    Close {
        resource: &'static str,
        reason: String,
    },
}

impl BrowserError {
    /// Map an engine error onto the probe failure taxonomy.
    ///
    /// Chromium only reports network failures as `net::ERR_*` text, so
    /// navigation errors are classified by matching those codes.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Navigation { reason, .. } => classify_net_error(reason),
            Self::Launch(_) | Self::Page(_) | Self::Close { .. } => FailureKind::Other,
        }
    }

    /// The raw engine text, without the wrapping context.
    pub fn detail(&self) -> String {
        match self {
            Self::Navigation { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

pub fn classify_net_error(reason: &str) -> FailureKind {
    if UNREACHABLE_ERRORS.iter().any(|code| reason.contains(code)) {
        FailureKind::Unreachable
    } else if TIMEOUT_ERRORS.iter().any(|code| reason.contains(code)) {
        FailureKind::Timeout
    } else {
        FailureKind::Other
    }
}

/// Seconds with two decimals, e.g. `4.50s`.
pub fn format_secs(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

/// Trait for measuring how long a URL takes to load.
///
/// Implementations never fail: every error is folded into [`ProbeResult::Failure`].
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str, navigation_timeout: Duration) -> ProbeResult;
}

/// Starts a fresh browser process for one probe.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// A running browser instance. `close` must be safe to call after a failed navigation.
#[async_trait]
pub trait BrowserSession: Send {
    async fn new_page(&mut self) -> Result<Box<dyn PageSession>, BrowserError>;
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// A single tab inside a [`BrowserSession`].
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to `url` and wait until the page has loaded.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;
    async fn close(&mut self) -> Result<(), BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_resolution_failure_is_unreachable() {
        assert_eq!(
            classify_net_error("net::ERR_NAME_NOT_RESOLVED"),
            FailureKind::Unreachable
        );
        assert_eq!(
            classify_net_error("navigate failed: net::ERR_CONNECTION_REFUSED"),
            FailureKind::Unreachable
        );
        assert_eq!(
            classify_net_error("net::ERR_CONNECTION_RESET"),
            FailureKind::Unreachable
        );
    }

    #[test]
    fn network_timeout_codes_are_timeouts() {
        assert_eq!(
            classify_net_error("net::ERR_CONNECTION_TIMED_OUT"),
            FailureKind::Timeout
        );
    }

    #[test]
    fn unknown_errors_are_other() {
        assert_eq!(
            classify_net_error("net::ERR_CERT_AUTHORITY_INVALID"),
            FailureKind::Other
        );
        assert_eq!(classify_net_error("target crashed"), FailureKind::Other);
    }

    #[test]
    fn browser_error_kinds() {
        let timeout = BrowserError::Timeout {
            url: "https://a.example".into(),
        };
        assert_eq!(timeout.failure_kind(), FailureKind::Timeout);

        let nav = BrowserError::Navigation {
            url: "https://a.example".into(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        };
        assert_eq!(nav.failure_kind(), FailureKind::Unreachable);
        assert_eq!(nav.detail(), "net::ERR_NAME_NOT_RESOLVED");

        let launch = BrowserError::Launch("no such file".into());
        assert_eq!(launch.failure_kind(), FailureKind::Other);
        assert!(launch.detail().contains("no such file"));
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_secs(Duration::from_millis(4500)), "4.50s");
        assert_eq!(format_secs(Duration::ZERO), "0.00s");
        assert_eq!(format_secs(Duration::from_millis(1234)), "1.23s");
    }
}
