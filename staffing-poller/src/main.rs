//! Staffing Poller
//!
//! A stateless worker that runs the shift-confirmation scraper on behalf of
//! the staffing hub.
//!
//! Architecture:
//! - Configuration: command-line flags backed by environment variables
//! - Repositories: HTTP communication with the hub (claim, complete)
//! - Services: scraper subprocess, export detection, S3 upload
//! - Scheduler: claim polling and run lifecycle
//!
//! The poller asks the hub for a pending run, executes the scraper, uploads
//! the CSV it produced, and reports the outcome. Two one-shot modes sit next
//! to the loop: `daily-export` for cron and `trigger` for operators.

mod config;
mod daily;
mod error;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, DailyExportArgs, DailyExportConfig, HubArgs, HubConfig, PollArgs};
use crate::daily::DailyExport;
use crate::repository::HttpRunRepository;
use crate::scheduler::RunPoller;
use crate::service::{ProcessScraper, S3UploadService};
use staffing_client::HubClient;

const DEFAULT_LOG_FILTER: &str = "staffing_poller=info,staffing_client=info";

#[derive(Debug, Parser)]
#[command(
    name = "staffing-poller",
    version,
    about = "Runs the staffing scraper for runs claimed from the hub",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Log level (info, debug, ...) or a full filter directive
    #[arg(long, global = true, env = "STAFFING_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    poll: PollArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Claim and execute runs until interrupted (default)
    Poll(PollArgs),

    /// Export the previous day's plan once and exit
    DailyExport(DailyExportArgs),

    /// Ask the hub to queue a new run
    Trigger(HubArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(log_filter(cli.log_level.as_deref()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        None => poll(cli.poll).await,
        Some(Command::Poll(args)) => poll(args).await,
        Some(Command::DailyExport(args)) => daily_export(args).await,
        Some(Command::Trigger(args)) => trigger(args).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

/// Runs the claim/execute/report loop until Ctrl+C
async fn poll(args: PollArgs) -> Result<()> {
    info!("Starting Staffing Poller");

    let config = Config::from_args(args).context("Invalid configuration")?;
    info!(
        "Loaded configuration: poller_id={}, api_base={}",
        config.poller_id, config.hub.api_base
    );
    match &config.storage.bucket {
        Some(bucket) => info!(
            "Uploading exports to s3://{}/{} ({})",
            bucket, config.storage.folder, config.storage.region
        ),
        None => info!("No bucket configured, exports stay local"),
    }

    let client = HubClient::new(&config.hub.api_base, &config.hub.secret)
        .context("Failed to build hub client")?;
    let runs = Arc::new(HttpRunRepository::new(client, config.poller_id.clone()));
    let scraper = Arc::new(ProcessScraper::new(config.scraper.clone()));
    let uploads = Arc::new(S3UploadService::from_env(&config.storage.region).await);

    info!(
        "Poll interval: {:?}, cooldown: {:?}, forbidden backoff: {:?}",
        config.poll_interval, config.run_cooldown, config.forbidden_backoff
    );

    RunPoller::new(config, runs, scraper, uploads)
        .run_until(shutdown_signal())
        .await;

    info!("Staffing Poller stopped");
    Ok(())
}

/// Exports one day plan and exits
async fn daily_export(args: DailyExportArgs) -> Result<()> {
    let config = DailyExportConfig::from_args(args).context("Invalid configuration")?;
    let scraper = Arc::new(ProcessScraper::new(config.scraper.clone()));
    let uploads = Arc::new(S3UploadService::from_env(&config.storage.region).await);

    let uploaded = DailyExport::new(config, scraper, uploads)
        .run(Local::now().date_naive())
        .await
        .context("Daily export failed")?;

    if let Some(key) = uploaded {
        info!("Daily export stored at {}", key);
    }
    Ok(())
}

/// Queues a run on the hub and prints its answer
async fn trigger(args: HubArgs) -> Result<()> {
    let hub = HubConfig::from_args(args).context("Invalid configuration")?;
    let client =
        HubClient::new(&hub.api_base, &hub.secret).context("Failed to build hub client")?;

    let response = client
        .trigger_run()
        .await
        .context("Failed to trigger run")?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Resolves once Ctrl+C is received
///
/// The handler is registered on the first poll, which `RunPoller::run_until`
/// performs before claiming anything.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Builds the tracing filter
///
/// A bare level applies to this binary and the hub client; anything that
/// looks like a directive is used verbatim. Without a level, `RUST_LOG` is
/// consulted before falling back to `info`.
fn log_filter(level: Option<&str>) -> EnvFilter {
    log_directive(level)
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn log_directive(level: Option<&str>) -> Option<String> {
    let level = level.map(str::trim).filter(|l| !l.is_empty())?;
    if level.contains('=') || level.contains(',') {
        return Some(level.to_string());
    }

    let level = level.to_lowercase();
    Some(format!(
        "staffing_poller={0},staffing_client={0}",
        level
    ))
}
