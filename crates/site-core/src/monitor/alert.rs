use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monitor::state::MonitorTarget;
use crate::probe::{format_secs, FailureKind, ProbeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    Unreachable,
    TimedOut,
}

impl AlertReason {
    fn headline(self) -> &'static str {
        match self {
            Self::Unreachable => "site unreachable!",
            Self::TimedOut => "site load timed out!",
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "Unreachable"),
            Self::TimedOut => write!(f, "Timed Out"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub target: MonitorTarget,
    pub reason: AlertReason,
    pub detail: String,
}

impl AlertEvent {
    pub fn new(target: MonitorTarget, reason: AlertReason, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            target,
            reason,
            detail: detail.into(),
        }
    }

    /// Render the HTML body pushed to the notification service.
    pub fn to_html(&self) -> String {
        let event_time = self
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        format!(
            "<b>Notice:</b> {} <strong>{}</strong></br><b>Event time:</b> {}</br><b>Error:</b> {}",
            self.target,
            self.reason.headline(),
            event_time,
            self.detail
        )
    }
}

/// Decide whether a probe outcome is worth an alert.
///
/// Every failure alerts. A successful load alerts only when it took strictly
/// longer than `threshold`.
pub fn classify(
    target: &MonitorTarget,
    result: &ProbeResult,
    threshold: Duration,
) -> Option<AlertEvent> {
    match result {
        ProbeResult::Failure {
            kind: FailureKind::Timeout,
            detail,
        } => Some(AlertEvent::new(
            target.clone(),
            AlertReason::TimedOut,
            detail.clone(),
        )),
        ProbeResult::Failure {
            kind: FailureKind::Unreachable | FailureKind::Other,
            detail,
        } => Some(AlertEvent::new(
            target.clone(),
            AlertReason::Unreachable,
            detail.clone(),
        )),
        ProbeResult::Success { duration } if *duration > threshold => Some(AlertEvent::new(
            target.clone(),
            AlertReason::TimedOut,
            format!("load time {}", format_secs(*duration)),
        )),
        ProbeResult::Success { .. } => None,
    }
}
