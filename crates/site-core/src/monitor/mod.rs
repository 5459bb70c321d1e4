pub mod alert;
pub mod engine;
pub mod state;

pub use alert::{classify, AlertEvent, AlertReason};
pub use engine::Monitor;
pub use state::{CycleReport, MonitorTarget, NotifyOutcome, TargetReport};
