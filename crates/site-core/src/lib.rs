#![forbid(unsafe_code)]

pub mod config;
pub mod monitor;
pub mod notify;
pub mod probe;

pub use config::{ConfigError, PollingConfig};
pub use monitor::{
    classify, AlertEvent, AlertReason, CycleReport, Monitor, MonitorTarget, NotifyOutcome,
    TargetReport,
};
pub use notify::{Notifier, NotifyError, PushPlusConfig, PushPlusNotifier};
pub use probe::{
    format_secs, BrowserError, BrowserLauncher, BrowserProbe, BrowserSession, ChromeLauncher,
    FailureKind, PageSession, ProbeResult, Prober,
};
