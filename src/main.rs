//! # HwBot — homework review status watcher
//!
//! Polls the review status API and forwards status changes to a Telegram chat.
//!
//! Usage:
//!   hwbot                          # Run forever, config from ~/.hwbot/config.toml + env
//!   hwbot --config bot.toml        # Explicit config file
//!   hwbot --iterations 1           # Single poll, then exit
//!
//! Required environment: PRACTICUM_TOKEN, TELEGRAM_TOKEN, TELEGRAM_CHAT_ID.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hwbot_channels::TelegramChannel;
use hwbot_core::config::LogConfig;
use hwbot_core::traits::Channel;
use hwbot_core::HwBotConfig;
use hwbot_poller::{HttpStatusFetcher, LoopConfig, Notifier, PollLoop, StatusInterpreter};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "hwbot",
    version,
    about = "Homework review status watcher with Telegram notifications"
)]
struct Cli {
    /// Config file (default: ~/.hwbot/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dotenv file to load before reading the environment (default: ./.env)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Stop after this many poll iterations (default: run forever)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    iterations: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(log: &LogConfig, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&log.dir)
        .with_context(|| format!("creating log directory {}", log.dir))?;
    let file_appender = tracing_appender::rolling::never(&log.dir, &log.file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("installing log subscriber")?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("loading env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let mut config = match &cli.config {
        Some(path) => HwBotConfig::load_from(path)?,
        None => HwBotConfig::load()?,
    };
    config.apply_process_env()?;

    let guard = init_logging(&config.log, cli.verbose)?;

    let creds = match config.credentials() {
        Ok(creds) => creds,
        Err(e) => {
            tracing::error!("CRITICAL: {e}. Bot stopped.");
            eprintln!("hwbot: {e}");
            drop(guard);
            std::process::exit(1);
        }
    };
    tracing::debug!("Credentials present: {creds:?}");

    let mut telegram = config.telegram.clone();
    telegram.bot_token = creds.bot_token.clone();
    let channel = Arc::new(TelegramChannel::new(telegram)?);
    if let Err(e) = channel.connect().await {
        tracing::warn!("Telegram getMe failed, continuing: {e}");
    }

    let fetcher = HttpStatusFetcher::from_config(&config.api, creds.api_token.clone())?;
    let mut poller = PollLoop::new(
        Box::new(fetcher),
        StatusInterpreter::default(),
        Notifier::new(channel, creds.chat_id.clone()),
        LoopConfig::from_config(&config.poller),
    );

    tracing::info!(
        "HwBot v{} watching {}",
        env!("CARGO_PKG_VERSION"),
        config.api.endpoint
    );
    poller.run_for(cli.iterations).await;

    Ok(())
}
