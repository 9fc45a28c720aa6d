//! TICKERTAPE — scheduled market-data scraper and posting bot
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the scrapers, data clients and publisher into the job pipeline,
//! registers the daily schedule and runs the dispatch loop with graceful
//! shutdown.

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use tickertape::config;
use tickertape::data::coingecko::CoinGeckoClient;
use tickertape::data::edgar::EdgarClient;
use tickertape::engine::jobs::{Deps, Pipeline, PipelineJob, Settings};
use tickertape::engine::scheduler::{Scheduler, TickReport};
use tickertape::scrape::browser::ChromeDriver;
use tickertape::storage::Checkpoint;
use tickertape::tweet::twitter;

const BANNER: &str = r#"
 _____ ___ ____ _  _______ ____ _____  _    ____  _____
|_   _|_ _/ ___| |/ / ____|  _ \_   _|/ \  |  _ \| ____|
  | |  | | |   | ' /|  _| | |_) || | / _ \ | |_) |  _|
  | |  | | |___| . \| |___|  _ < | |/ ___ \|  __/| |___
  |_| |___\____|_|\_\_____|_| \_\|_/_/   \_\_|   |_____|

  Scheduled market-data scraper and posting bot
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    println!("{BANNER}");
    info!(
        bot_name = %cfg.bot.name,
        tick_interval_secs = cfg.bot.tick_interval_secs,
        jobs = cfg.schedule.len(),
        dry_run = cfg.twitter.dry_run,
        "TICKERTAPE starting up"
    );

    // -- Initialise components -------------------------------------------

    let http_timeout = Duration::from_secs(cfg.endpoints.http_timeout_secs);
    let crypto = CoinGeckoClient::new(&cfg.endpoints.coingecko_base_url, http_timeout)?;
    let filings = EdgarClient::new(
        &cfg.endpoints.sec_www_base_url,
        &cfg.endpoints.sec_data_base_url,
        &cfg.endpoints.sec_user_agent,
        http_timeout,
    )?;

    // Publisher and timeline reader share one client when credentials exist
    let (publisher, timeline) = twitter::connect(&cfg.twitter);

    let deps = Deps {
        driver: Arc::new(ChromeDriver::new(cfg.browser.clone())),
        publisher,
        timeline,
        crypto: Arc::new(crypto),
        filings: Arc::new(filings),
        checkpoint: Checkpoint::new(&cfg.bot.checkpoint_file),
    };
    let pipeline = Arc::new(Pipeline::new(deps, Settings::from_config(&cfg)?));

    // -- Schedule --------------------------------------------------------

    let now = Local::now().naive_local();
    let mut scheduler = Scheduler::new();
    for entry in &cfg.schedule {
        let job = PipelineJob::new(&entry.name, entry.job.clone(), pipeline.clone());
        scheduler.every_day_at(entry.time()?, Box::new(job), now);
    }
    if scheduler.is_empty() {
        warn!("Schedule is empty, nothing will be posted");
    }

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.bot.tick_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.bot.tick_interval_secs,
        next_run = ?scheduler.next_run(),
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = scheduler.run_pending(Local::now().naive_local()).await;
                log_tick_report(&report, &scheduler);
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("TICKERTAPE shut down cleanly.");
    Ok(())
}

/// Log a summary of a tick that ran at least one job.
fn log_tick_report(report: &TickReport, scheduler: &Scheduler) {
    if report.ran.is_empty() {
        return;
    }
    info!(
        jobs = ?report.ran,
        published = report.published,
        quiet = report.quiet,
        failed = report.failed,
        next_run = ?scheduler.next_run(),
        "Tick complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tickertape=info"));

    let json_logging = std::env::var("TICKERTAPE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
