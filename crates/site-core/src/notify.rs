//! Alert delivery.
//!
//! The monitor hands a rendered HTML message to a [`Notifier`]. The bundled
//! [`PushPlusNotifier`] POSTs it as JSON to a PushPlus-compatible endpoint
//! and treats any application code other than 200 as a failed delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_PUSH_ENDPOINT: &str = "http://www.pushplus.plus/send";

/// Settings for the push notification service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPlusConfig {
    pub token: String,
    pub title: String,
    #[serde(default)]
    pub topic: i64,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_push_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_PUSH_ENDPOINT.to_string()
}

fn default_push_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
    #[error("Push rejected with code {code}: {msg}")]
    Rejected { code: i64, msg: String },
}

/// Sink for rendered alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, content: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    token: &'a str,
    title: &'a str,
    content: &'a str,
    template: &'a str,
    topic: i64,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Clone)]
pub struct PushPlusNotifier {
    client: Client,
    config: PushPlusConfig,
}

impl PushPlusNotifier {
    pub fn new(config: PushPlusConfig) -> Self {
        let client = Self::build_client(Duration::from_millis(config.timeout_ms));
        Self { client, config }
    }

    pub fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client")
    }
}

#[async_trait]
impl Notifier for PushPlusNotifier {
    async fn send(&self, content: &str) -> Result<(), NotifyError> {
        let url = &self.config.endpoint;
        let request = PushRequest {
            token: &self.config.token,
            title: &self.config.title,
            content,
            template: "html",
            topic: self.config.topic,
        };

        let response = self
            .client
            .post(url)
            .header("User-Agent", "site-monitor/0.1")
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| NotifyError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        info!(status = status.as_u16(), body = %body, "Push service response");

        let parsed: PushResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(NotifyError::Http {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            Err(e) => {
                return Err(NotifyError::InvalidResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
        };

        if parsed.code != 200 {
            return Err(NotifyError::Rejected {
                code: parsed.code,
                msg: parsed.msg,
            });
        }
        debug!(url = %url, "Push delivered");
        Ok(())
    }
}
