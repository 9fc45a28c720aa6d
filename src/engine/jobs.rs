//! Scrape → filter → format → publish pipelines.
//!
//! `JobKind` is the config-facing description of a job; `Pipeline` holds
//! the collaborators and settings shared by all jobs and runs one kind at a
//! time. `PipelineJob` adapts a named kind to the scheduler's `Job` trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::scheduler::Job;
use super::selector::ViewSelector;
use crate::config::{parse_weekday, AppConfig, ThresholdsConfig, WatchConfig};
use crate::data::{CryptoFeed, FilingLookup};
use crate::filter::{self, merge_by_ticker, CategoryTable, Labeled};
use crate::scrape::{self, collect_rows, PageDriver};
use crate::storage::Checkpoint;
use crate::tweet::{self, format, Publisher, TimelineReader};
use crate::types::{BotError, CalendarView, EarningsRecord, MoverPage, QuoteRecord, ReportTime};

// ---------------------------------------------------------------------------
// Job description
// ---------------------------------------------------------------------------

/// What a scheduled slot does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    /// Companies reporting in `session` today.
    Earnings { session: ReportTime },
    /// Economic calendar; `view` unset means "ask the selector".
    EconCalendar {
        #[serde(default)]
        view: Option<CalendarView>,
    },
    Movers { page: MoverPage },
    /// Overnight drops across the watched sectors.
    Overnight,
    /// Crypto stocks, posted only when BTC moved past the threshold.
    CryptoWatch,
    /// Meme stocks, posted only when the watched account posted.
    MemeWatch,
    /// EDGAR filings of today's watchlist.
    EarningsFilings,
}

/// How a job run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Published { post_id: String },
    /// Nothing was posted; `reason` says why.
    Quiet { reason: String },
}

impl JobOutcome {
    fn quiet(reason: impl Into<String>) -> Self {
        JobOutcome::Quiet { reason: reason.into() }
    }
}

// ---------------------------------------------------------------------------
// Collaborators and settings
// ---------------------------------------------------------------------------

/// External collaborators shared by every job.
#[derive(Clone)]
pub struct Deps {
    pub driver: Arc<dyn PageDriver>,
    pub publisher: Arc<dyn Publisher>,
    /// Needed only by the meme watch; `None` without a bearer token.
    pub timeline: Option<Arc<dyn TimelineReader>>,
    pub crypto: Arc<dyn CryptoFeed>,
    pub filings: Arc<dyn FilingLookup>,
    pub checkpoint: Checkpoint,
}

/// Job-independent knobs, resolved from `AppConfig` once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub page_timeout: Duration,
    pub post_placeholders: bool,
    pub thresholds: ThresholdsConfig,
    pub selector: ViewSelector,
    pub categories: CategoryTable,
    pub watch: WatchConfig,
    pub watchlist: HashMap<Weekday, Vec<String>>,
    pub watch_username: String,
}

impl Settings {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let mut watchlist: HashMap<Weekday, Vec<String>> = HashMap::new();
        for (day, tickers) in &cfg.earnings.watchlist {
            watchlist
                .entry(parse_weekday(day)?)
                .or_default()
                .extend(tickers.iter().map(|t| t.to_uppercase()));
        }

        Ok(Self {
            page_timeout: cfg.browser.page_timeout(),
            post_placeholders: cfg.bot.post_placeholders,
            thresholds: cfg.thresholds.clone(),
            selector: ViewSelector::from_config(&cfg.calendar)?,
            categories: cfg.category_table(),
            watch: cfg.watch.clone(),
            watchlist,
            watch_username: cfg.twitter.watch_username.clone(),
        })
    }

    fn watchlist_for(&self, day: Weekday) -> &[String] {
        self.watchlist.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    deps: Deps,
    settings: Settings,
}

impl Pipeline {
    pub fn new(deps: Deps, settings: Settings) -> Self {
        Self { deps, settings }
    }

    pub async fn run(&self, kind: &JobKind, now: NaiveDateTime) -> Result<JobOutcome> {
        let today = now.weekday();
        match kind {
            JobKind::Earnings { session } => self.earnings(*session, today).await,
            JobKind::EconCalendar { view } => {
                let view = view.unwrap_or_else(|| self.settings.selector.view_for(today));
                self.econ_calendar(view).await
            }
            JobKind::Movers { page } => self.movers(*page).await,
            JobKind::Overnight => self.overnight().await,
            JobKind::CryptoWatch => self.crypto_watch().await,
            JobKind::MemeWatch => self.meme_watch().await,
            JobKind::EarningsFilings => self.earnings_filings(today).await,
        }
    }

    // -- Jobs ------------------------------------------------------------

    async fn earnings(&self, session: ReportTime, today: Weekday) -> Result<JobOutcome> {
        let rows = scrape::earnings::fetch_earnings(
            self.deps.driver.as_ref(),
            self.settings.page_timeout,
        )
        .await?;
        let rows = collect_rows("earnings", rows);
        let selected = select_earnings(
            rows,
            session,
            self.settings.thresholds.earnings_market_cap,
            self.settings.watchlist_for(today),
        );
        info!(session = %session, count = selected.len(), "Earnings selected");

        let text = match session {
            ReportTime::BeforeOpen => format::premarket_earnings(&selected),
            _ => format::afterhours_earnings(&selected),
        };
        self.post(text, selected.is_empty()).await
    }

    async fn econ_calendar(&self, view: CalendarView) -> Result<JobOutcome> {
        let rows = scrape::econ::fetch_econ_calendar(
            self.deps.driver.as_ref(),
            view,
            self.settings.page_timeout,
        )
        .await?;
        let events = collect_rows("econ", rows);
        info!(view = %view, count = events.len(), "Economic events scraped");
        self.post(format::econ_calendar(view, &events), events.is_empty()).await
    }

    async fn movers(&self, page: MoverPage) -> Result<JobOutcome> {
        let rows = scrape::movers::fetch_movers(
            self.deps.driver.as_ref(),
            page,
            self.settings.page_timeout,
        )
        .await?;
        let movers = collect_rows("movers", rows);
        info!(page = %page, count = movers.len(), "Movers scraped");
        self.post(format::movers(page, &movers), movers.is_empty()).await
    }

    async fn overnight(&self) -> Result<JobOutcome> {
        let names = &self.settings.watch.overnight_categories;
        let quotes = self.quotes_for(names).await?;
        let labeled = self.label(names, &quotes);

        let threshold = self.settings.thresholds.overnight_drop;
        let mut drops: Vec<Labeled<QuoteRecord>> =
            filter::apply(threshold, labeled, |l| l.record.change_pct);
        drops.sort_by(|a, b| {
            let (a, b) = (a.record.change_pct, b.record.change_pct);
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
        info!(scanned = quotes.len(), drops = drops.len(), "Overnight drops filtered");

        self.post(format::overnight_drops(&drops), drops.is_empty()).await
    }

    async fn crypto_watch(&self) -> Result<JobOutcome> {
        let btc = self.deps.crypto.bitcoin().await?;
        let threshold = self.settings.thresholds.btc_move;
        if !threshold.passes(Some(btc.change_24h_pct)) {
            return Ok(JobOutcome::quiet(format!(
                "BTC moved {:+.2}% in 24h, below alert threshold",
                btc.change_24h_pct
            )));
        }

        info!(change_24h_pct = btc.change_24h_pct, "BTC alert triggered");
        let names = &self.settings.watch.crypto_categories;
        let quotes = self.quotes_for(names).await?;
        let stocks = self.label(names, &quotes);
        self.publish(format::btc_move(&btc, &stocks)).await
    }

    async fn meme_watch(&self) -> Result<JobOutcome> {
        let Some(timeline) = &self.deps.timeline else {
            return Ok(JobOutcome::quiet("no timeline access configured"));
        };
        let username = &self.settings.watch_username;
        let Some(user_id) = timeline.user_id(username).await? else {
            return Ok(JobOutcome::quiet(format!("account @{username} not found")));
        };
        let Some(latest) = timeline.latest_post_id(&user_id).await? else {
            return Ok(JobOutcome::quiet(format!("@{username} has no posts")));
        };

        let is_new = self
            .deps
            .checkpoint
            .advance(&latest)
            .map_err(|e| BotError::Storage(format!("{e:#}")))?;
        if !is_new {
            return Ok(JobOutcome::quiet(format!("no new post from @{username}")));
        }

        info!(username = %username, post_id = %latest, "New post from watched account");
        let quotes = self.quotes_for(&self.settings.watch.meme_categories).await?;
        self.post(format::meme_stocks(&quotes), quotes.is_empty()).await
    }

    async fn earnings_filings(&self, today: Weekday) -> Result<JobOutcome> {
        let mut filings = Vec::new();
        for ticker in self.settings.watchlist_for(today) {
            match self.deps.filings.latest_earnings_filing(ticker).await {
                Ok(Some(f)) => filings.push(f),
                Ok(None) => debug!(ticker = %ticker, "No earnings filing"),
                Err(e) => warn!(ticker = %ticker, error = %e, "Filing lookup failed"),
            }
        }
        self.post(format::earnings_filings(&filings), filings.is_empty()).await
    }

    // -- Helpers ---------------------------------------------------------

    /// Scrape quotes for the union of `names`, each ticker once.
    async fn quotes_for(&self, names: &[String]) -> Result<Vec<QuoteRecord>> {
        let tickers = self.settings.categories.tickers_for(names);
        let rows = scrape::quotes::fetch_quotes(
            self.deps.driver.as_ref(),
            &tickers,
            self.settings.page_timeout,
        )
        .await?;
        let quotes = collect_rows("robinhood", rows);
        for q in quotes.iter().filter(|q| q.change_pct.is_none()) {
            let err = BotError::Format { field: format!("{} change", q.ticker), value: q.change.clone() };
            warn!(error = %err, "Quote excluded from thresholds");
        }
        Ok(quotes)
    }

    fn label(&self, names: &[String], quotes: &[QuoteRecord]) -> Vec<Labeled<QuoteRecord>> {
        let grouped = self.settings.categories.group(names, quotes, |q| q.ticker.as_str());
        merge_by_ticker(grouped, |q| q.ticker.as_str())
    }

    /// Publish `text`, or stay quiet when it is a placeholder and
    /// placeholders are switched off.
    async fn post(&self, text: String, placeholder: bool) -> Result<JobOutcome> {
        if placeholder && !self.settings.post_placeholders {
            return Ok(JobOutcome::quiet(text));
        }
        self.publish(text).await
    }

    async fn publish(&self, text: String) -> Result<JobOutcome> {
        let text = tweet::clamp_to_limit(&text);
        let receipt = self
            .deps
            .publisher
            .publish(&text)
            .await
            .context("Publishing failed")?;
        Ok(JobOutcome::Published { post_id: receipt.id })
    }
}

/// Rows reporting in `session` that are either large enough or watched.
pub fn select_earnings(
    rows: Vec<EarningsRecord>,
    session: ReportTime,
    min_market_cap: filter::Threshold,
    watchlist: &[String],
) -> Vec<EarningsRecord> {
    rows.into_iter()
        .filter(|r| r.time == session)
        .filter(|r| {
            min_market_cap.passes(Some(r.market_cap_value)) || watchlist.contains(&r.ticker)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scheduler adapter
// ---------------------------------------------------------------------------

pub struct PipelineJob {
    name: String,
    kind: JobKind,
    pipeline: Arc<Pipeline>,
}

impl PipelineJob {
    pub fn new(name: impl Into<String>, kind: JobKind, pipeline: Arc<Pipeline>) -> Self {
        Self { name: name.into(), kind, pipeline }
    }
}

#[async_trait]
impl Job for PipelineJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, now: NaiveDateTime) -> Result<JobOutcome> {
        self.pipeline.run(&self.kind, now).await
    }
}
