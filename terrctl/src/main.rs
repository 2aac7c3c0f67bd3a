//! terrctl - Entry Point
//!
//! Packages a local source tree, uploads it to the build-and-run service and
//! waits until the resulting instance is deployed and reachable.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use terrctl::app::options::DeployOptions;
use terrctl::app::run::run;
use terrctl::filesys::file::File;
use terrctl::logs::{init_logging, LogLevel, LogOptions};
use terrctl::models::upload::Language;
use terrctl::storage::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "terrctl")]
#[command(about = "Deploy a source tree to the build-and-run service")]
#[command(version)]
struct Cli {
    /// Source code directory to deploy
    source: PathBuf,

    /// Language (auto|c|rust|assemblyscript|wasm)
    #[arg(long)]
    language: Option<Language>,

    /// Timeout for deployment (seconds)
    #[arg(long, value_name = "SECONDS")]
    deploy_timeout: Option<u64>,

    /// Timeout for health checks (seconds)
    #[arg(long, value_name = "SECONDS")]
    health_timeout: Option<u64>,

    /// Timeout for HTTP client queries (seconds)
    #[arg(long, value_name = "SECONDS")]
    http_timeout: Option<u64>,

    /// Maximum number of attempts for deployment
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_deploy_attempts: Option<u32>,

    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Layer command line flags over the settings file
    fn options(&self, settings: Settings) -> DeployOptions {
        let mut options = DeployOptions::from(settings);
        if let Some(language) = self.language {
            options.language = language;
        }
        if let Some(secs) = self.deploy_timeout {
            options.deploy_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(secs) = self.health_timeout {
            options.health_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(secs) = self.http_timeout {
            options.http_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_deploy_attempts {
            options.max_deploy_attempts = attempts;
        }
        options
    }
}

async fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => File::new(path)
            .read_json::<Settings>()
            .await
            .with_context(|| format!("Unable to read settings file {}", path.display())),
        None => Ok(Settings::default()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_options = LogOptions {
        log_level: cli.log_level.unwrap_or(settings.log_level),
        json_format: cli.log_json,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let options = cli.options(settings);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    match run(cli.source, options, cancel).await {
        Ok(url) => {
            info!("New instance deployed at [{}]", url);
            println!("{}", url);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to listen for shutdown signals");
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, cancelling...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, cancelling...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            error!("Unable to listen for Ctrl+C");
            return;
        }
        info!("Ctrl+C received, cancelling...");
    }

    cancel.cancel();
}
