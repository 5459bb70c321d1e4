mod config;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use site_core::{BrowserProbe, ChromeLauncher, Monitor, PushPlusNotifier};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        VERSION
    } else {
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Website availability monitor: load pages in headless Chrome and alert on failures.
#[derive(Parser)]
#[command(name = "site-monitor", version = version_string(), about)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, default_value = "conf.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match config::AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            fmt().with_env_filter(EnvFilter::new("error")).init();
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&app_config.log_format, &app_config.log_file) {
        eprintln!(
            "Failed to open log file {}: {}",
            app_config.log_file.display(),
            e
        );
        std::process::exit(1);
    }
    tracing::info!(
        path = %cli.config.display(),
        targets = app_config.url.len(),
        "Loaded config file"
    );

    let launcher = Arc::new(ChromeLauncher::new(app_config.chrome.clone()));
    let prober = Arc::new(BrowserProbe::new(launcher));
    let notifier = Arc::new(PushPlusNotifier::new(app_config.pushplus.clone()));

    let monitor = match Monitor::new(
        app_config.to_targets(),
        app_config.to_polling_config(),
        prober,
        notifier,
    ) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "Invalid polling configuration");
            std::process::exit(1);
        }
    };

    monitor.run(shutdown_signal()).await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Log to the console and append the same events to `log_file`.
fn init_tracing(log_format: &str, log_file: &Path) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = open_log_file(log_file)?;

    match log_format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(Mutex::new(file)))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
    }
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
