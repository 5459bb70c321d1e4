use std::fmt;

use serde::{Deserialize, Serialize};

use super::alert::{AlertEvent, AlertReason};
use crate::probe::ProbeResult;

/// A URL checked on every poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorTarget(String);

impl MonitorTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MonitorTarget {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<&str> for MonitorTarget {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Failed(String),
}

/// What happened to one target during a poll cycle.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: MonitorTarget,
    pub result: ProbeResult,
    pub alert: Option<AlertEvent>,
    /// `None` when no alert was raised.
    pub notification: Option<NotifyOutcome>,
}

impl TargetReport {
    pub fn alert_reason(&self) -> Option<AlertReason> {
        self.alert.as_ref().map(|a| a.reason)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub targets: Vec<TargetReport>,
}

impl CycleReport {
    pub fn alerts(&self) -> impl Iterator<Item = &AlertEvent> {
        self.targets.iter().filter_map(|t| t.alert.as_ref())
    }

    pub fn alert_count(&self) -> usize {
        self.alerts().count()
    }

    pub fn failed_notifications(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| matches!(t.notification, Some(NotifyOutcome::Failed(_))))
            .count()
    }
}
