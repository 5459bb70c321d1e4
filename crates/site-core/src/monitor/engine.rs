use std::future::Future;
use std::sync::Arc;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PollingConfig};
use crate::monitor::alert::classify;
use crate::monitor::state::{CycleReport, MonitorTarget, NotifyOutcome, TargetReport};
use crate::notify::Notifier;
use crate::probe::{format_secs, ProbeResult, Prober};

/// Periodically loads every target, classifies the outcome and pushes alerts.
///
/// Targets are checked one after another in configured order; a cycle never
/// starts before the previous one finished.
pub struct Monitor {
    targets: Vec<MonitorTarget>,
    config: PollingConfig,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        targets: Vec<MonitorTarget>,
        config: PollingConfig,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            targets,
            config,
            prober,
            notifier,
        })
    }

    /// Poll on a fixed interval until `shutdown` resolves.
    ///
    /// The first cycle runs one interval after start. Ticks missed while a
    /// cycle is running are skipped, not queued. Resolving `shutdown` during a
    /// cycle drops the in-flight probe.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        info!(
            targets = self.targets.len(),
            interval = %format_secs(self.config.interval),
            threshold = %format_secs(self.config.timeout_threshold),
            "Starting monitor"
        );

        let period = self.config.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);
        let mut cycle = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }

            cycle += 1;
            tokio::select! {
                report = self.poll_once() => {
                    debug!(
                        cycle,
                        alerts = report.alert_count(),
                        failed_notifications = report.failed_notifications(),
                        "Poll cycle complete"
                    );
                }
                _ = &mut shutdown => {
                    warn!(cycle, "Shutdown during poll cycle, abandoning remaining targets");
                    break;
                }
            }
        }

        info!(cycles = cycle, "Monitor stopped");
    }

    /// Run a single sweep over all targets.
    pub async fn poll_once(&self) -> CycleReport {
        let mut report = CycleReport {
            targets: Vec::with_capacity(self.targets.len()),
        };
        for target in &self.targets {
            report.targets.push(self.check_target(target).await);
        }
        report
    }

    async fn check_target(&self, target: &MonitorTarget) -> TargetReport {
        let result = self
            .prober
            .probe(target.as_str(), self.config.navigation_timeout)
            .await;

        match &result {
            ProbeResult::Success { duration } => {
                info!(url = %target, duration = %format_secs(*duration), "Page loaded");
            }
            ProbeResult::Failure { kind, detail } => {
                warn!(url = %target, kind = %kind, error = %detail, "Page load failed");
            }
        }

        let Some(alert) = classify(target, &result, self.config.timeout_threshold) else {
            return TargetReport {
                target: target.clone(),
                result,
                alert: None,
                notification: None,
            };
        };

        let notification = match self.notifier.send(&alert.to_html()).await {
            Ok(()) => {
                info!(url = %target, reason = %alert.reason, "Alert delivered");
                NotifyOutcome::Delivered
            }
            Err(e) => {
                warn!(url = %target, reason = %alert.reason, error = %e, "Alert delivery failed");
                NotifyOutcome::Failed(e.to_string())
            }
        };

        TargetReport {
            target: target.clone(),
            result,
            alert: Some(alert),
            notification: Some(notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::monitor::alert::AlertReason;
    use crate::notify::NotifyError;
    use crate::probe::FailureKind;

    struct ScriptedProber {
        results: HashMap<String, ProbeResult>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, url: &str, _navigation_timeout: Duration) -> ProbeResult {
            self.calls.lock().unwrap().push(url.to_string());
            self.results
                .get(url)
                .cloned()
                .unwrap_or_else(|| panic!("ScriptedProber: unexpected URL: {}", url))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        reject: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, content: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(content.to_string());
            if self.reject {
                return Err(NotifyError::Rejected {
                    code: 500,
                    msg: "server busy".into(),
                });
            }
            Ok(())
        }
    }

    fn monitor(
        results: Vec<(&str, ProbeResult)>,
        notifier: Arc<RecordingNotifier>,
        threshold: Duration,
    ) -> (Monitor, Arc<ScriptedProber>) {
        let targets = results.iter().map(|(url, _)| MonitorTarget::from(*url)).collect();
        let prober = Arc::new(ScriptedProber {
            results: results
                .into_iter()
                .map(|(url, r)| (url.to_string(), r))
                .collect(),
            calls: Mutex::new(Vec::new()),
        });
        let config = PollingConfig::default().with_timeout_threshold(threshold);
        let m = Monitor::new(targets, config, prober.clone(), notifier).unwrap();
        (m, prober)
    }

    #[tokio::test]
    async fn healthy_target_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (m, prober) = monitor(
            vec![(
                "https://ok.example",
                ProbeResult::Success {
                    duration: Duration::from_secs(1),
                },
            )],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let report = m.poll_once().await;
        assert_eq!(report.alert_count(), 0);
        assert_eq!(prober.calls.lock().unwrap().len(), 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_notification_is_reported_not_raised() {
        let notifier = Arc::new(RecordingNotifier {
            reject: true,
            ..Default::default()
        });
        let (m, _) = monitor(
            vec![(
                "https://down.example",
                ProbeResult::failure(FailureKind::Unreachable, "net::ERR_NAME_NOT_RESOLVED"),
            )],
            notifier.clone(),
            Duration::from_secs(5),
        );

        let report = m.poll_once().await;
        assert_eq!(report.targets[0].alert_reason(), Some(AlertReason::Unreachable));
        assert_eq!(
            report.targets[0].notification,
            Some(NotifyOutcome::Failed("Push rejected with code 500: server busy".into()))
        );
    }

    #[test]
    fn zero_interval_is_rejected_at_construction() {
        let prober = Arc::new(ScriptedProber {
            results: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let config = PollingConfig::default().with_interval(Duration::ZERO);
        assert!(Monitor::new(vec![], config, prober, notifier).is_err());
    }

    #[test]
    fn oversized_interval_is_rejected_at_construction() {
        let prober = Arc::new(ScriptedProber {
            results: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let config =
            PollingConfig::default().with_interval(Duration::from_secs(i64::MAX as u64));
        let err = Monitor::new(vec![], config, prober, notifier).err().expect("rejected");
        assert!(matches!(err, ConfigError::TooLarge { field: "interval", .. }), "{err}");
    }
}
