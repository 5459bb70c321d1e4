use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{format_secs, BrowserLauncher, BrowserSession, FailureKind, ProbeResult, Prober};

/// Measures page loads in a real browser, one fresh browser process per probe.
///
/// The page is closed before the browser on every exit path, including a
/// navigation that errors, times out or panics.
#[derive(Clone)]
pub struct BrowserProbe {
    launcher: Arc<dyn BrowserLauncher>,
}

impl BrowserProbe {
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self { launcher }
    }
}

#[async_trait]
impl Prober for BrowserProbe {
    async fn probe(&self, url: &str, navigation_timeout: Duration) -> ProbeResult {
        let mut browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                warn!(url, error = %e, "Browser launch failed");
                return ProbeResult::failure(e.failure_kind(), e.detail());
            }
        };

        let result = measure(browser.as_mut(), url, navigation_timeout).await;

        if let Err(e) = browser.close().await {
            warn!(url, error = %e, "Failed to release browser");
        }
        result
    }
}

async fn measure(
    browser: &mut dyn BrowserSession,
    url: &str,
    navigation_timeout: Duration,
) -> ProbeResult {
    let mut page = match browser.new_page().await {
        Ok(page) => page,
        Err(e) => {
            warn!(url, error = %e, "Failed to open page");
            return ProbeResult::failure(e.failure_kind(), e.detail());
        }
    };

    let start = Instant::now();
    let navigation = AssertUnwindSafe(tokio::time::timeout(
        navigation_timeout,
        page.navigate(url),
    ))
    .catch_unwind()
    .await;
    let elapsed = start.elapsed();

    if let Err(e) = page.close().await {
        warn!(url, error = %e, "Failed to release page");
    }

    match navigation {
        Ok(Ok(Ok(()))) => ProbeResult::Success { duration: elapsed },
        Ok(Ok(Err(e))) => {
            debug!(url, error = %e, "Navigation failed");
            ProbeResult::failure(e.failure_kind(), e.detail())
        }
        Ok(Err(_)) => ProbeResult::failure(
            FailureKind::Timeout,
            format!("navigation exceeded {}", format_secs(navigation_timeout)),
        ),
        Err(panic) => ProbeResult::failure(
            FailureKind::Other,
            format!("navigation panicked: {}", panic_message(panic.as_ref())),
        ),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
