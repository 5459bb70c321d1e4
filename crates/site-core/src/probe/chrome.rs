use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{BrowserError, BrowserLauncher, BrowserSession, PageSession};

const CHROME_FLAGS: &[&str] = &[
    "--disable-gpu",
    "--ignore-certificate-errors",
    "--disable-crash-reporter",
    "--disable-notifications",
    "--hide-scrollbars",
    "--mute-audio",
];

const WINDOW_WIDTH: u32 = 1080;
const WINDOW_HEIGHT: u32 = 1920;

/// Launches headless Chrome through the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    executable: Option<PathBuf>,
    request_timeout: Duration,
}

impl ChromeLauncher {
    /// `executable` of `None` lets chromiumoxide search the usual install locations.
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Timeout for individual DevTools commands.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .incognito()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .request_timeout(self.request_timeout)
            .args(CHROME_FLAGS.iter().copied());
        if let Some(ref path) = self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

impl Default for ChromeLauncher {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler drives the websocket connection and must be polled for
        // any command to complete. It ends when the connection closes.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler error");
                }
            }
        });

        Ok(Box::new(ChromeSession {
            browser,
            handler_task,
            closed: false,
        }))
    }
}

struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    closed: bool,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn new_page(&mut self) -> Result<Box<dyn PageSession>, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Page(e.to_string()))?;
        Ok(Box::new(ChromePage { page: Some(page) }))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let closed = self.browser.close().await.map(|_| ());
        let waited = self.browser.wait().await;
        self.handler_task.abort();

        closed.map_err(|e| BrowserError::Close {
            resource: "browser",
            reason: e.to_string(),
        })?;
        waited.map_err(|e| BrowserError::Close {
            resource: "browser",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Dropping `Browser` kills a still-running child process.
        self.handler_task.abort();
    }
}

struct ChromePage {
    page: Option<Page>,
}

#[async_trait]
impl PageSession for ChromePage {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let page = self.page.as_ref().ok_or_else(|| BrowserError::Navigation {
            url: url.to_string(),
            reason: "page already closed".into(),
        })?;
        page.goto(url).await.map_err(|e| navigation_error(url, e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| navigation_error(url, e))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        match self.page.take() {
            Some(page) => page.close().await.map_err(|e| BrowserError::Close {
                resource: "page",
                reason: e.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn navigation_error(url: &str, err: CdpError) -> BrowserError {
    match err {
        CdpError::Timeout => BrowserError::Timeout {
            url: url.to_string(),
        },
        other => BrowserError::Navigation {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
