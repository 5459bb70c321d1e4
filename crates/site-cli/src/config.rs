//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! url = ["https://www.example.com", "https://status.example.com/health"]
//! timeout = 5
//! polling = 60
//! chrome = "/usr/bin/chromium"
//! log_file = "app.log"
//!
//! [pushplus]
//! token = "your-token"
//! title = "Site Monitor"
//! topic = 1
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use site_core::{MonitorTarget, PollingConfig, PushPlusConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub url: Vec<String>,

    /// Soft latency budget in seconds.
    pub timeout: u64,

    /// Seconds between poll cycles.
    pub polling: u64,

    #[serde(default)]
    pub chrome: Option<PathBuf>,

    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_log_format")]
    pub log_format: String,

    pub pushplus: PushPlusConfig,
}

fn default_navigation_timeout() -> u64 {
    20
}

fn default_log_file() -> PathBuf {
    PathBuf::from("app.log")
}

fn default_log_format() -> String {
    "pretty".into()
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_polling_config(&self) -> PollingConfig {
        PollingConfig::default()
            .with_timeout_threshold(Duration::from_secs(self.timeout))
            .with_interval(Duration::from_secs(self.polling))
            .with_navigation_timeout(Duration::from_secs(self.navigation_timeout))
    }

    pub fn to_targets(&self) -> Vec<MonitorTarget> {
        self.url.iter().map(|u| MonitorTarget::new(u.as_str())).collect()
    }

    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("No URLs configured".into());
        }

        let mut seen = HashSet::new();
        for (i, u) in self.url.iter().enumerate() {
            let parsed = url::Url::parse(u)
                .map_err(|e| format!("Invalid URL at index {}: {} ({})", i, u, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!("URL must use http or https: {}", u));
            }
            if !seen.insert(u.as_str()) {
                return Err(format!("Duplicate URL: {}", u));
            }
        }

        self.to_polling_config()
            .validate()
            .map_err(|e| format!("Invalid timing settings: {}", e))?;

        if self.pushplus.token.is_empty() {
            return Err("pushplus.token must not be empty".into());
        }
        url::Url::parse(&self.pushplus.endpoint).map_err(|e| {
            format!(
                "Invalid pushplus endpoint: {} ({})",
                self.pushplus.endpoint, e
            )
        })?;

        match self.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }
}
