//! Jobs run end to end: fake pages in, recorded posts out.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use tickertape::config::{ThresholdsConfig, WatchConfig};
use tickertape::engine::jobs::{Deps, JobKind, JobOutcome, Pipeline, Settings};
use tickertape::engine::selector::ViewSelector;
use tickertape::filter::{Category, CategoryTable, Threshold};
use tickertape::scrape::quotes::quote_url;
use tickertape::storage::Checkpoint;
use tickertape::types::{CalendarView, MoverPage, ReportTime};

use crate::mock_driver::{
    FixedBitcoin, FixedFilings, MockBrowser, RecordingPublisher, ScriptedTimeline,
};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// 2026-10-19 is a Monday.
fn monday(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(h, m, 0).unwrap()
}

fn settings() -> Settings {
    Settings {
        page_timeout: Duration::from_secs(1),
        post_placeholders: false,
        thresholds: ThresholdsConfig {
            overnight_drop: Threshold::AtMost(-3.0),
            btc_move: Threshold::MagnitudeAtLeast(5.0),
            earnings_market_cap: Threshold::Above(1e9),
        },
        selector: ViewSelector::default(),
        categories: CategoryTable::new(vec![
            Category { name: "Crypto".into(), tickers: vec!["MSTR".into(), "COIN".into()] },
            Category { name: "Semis".into(), tickers: vec!["NVDA".into(), "AMD".into()] },
            Category { name: "Big Tech".into(), tickers: vec!["AMD".into(), "META".into()] },
            Category { name: "Meme Stocks".into(), tickers: vec!["GME".into(), "AMC".into()] },
        ]),
        watch: WatchConfig {
            overnight_categories: vec!["Semis".into(), "Big Tech".into()],
            crypto_categories: vec!["Crypto".into()],
            meme_categories: vec!["Meme Stocks".into()],
        },
        watchlist: HashMap::from([
            (Weekday::Mon, vec!["KD".into(), "PLTR".into()]),
            (Weekday::Tue, vec!["PYPL".into()]),
        ]),
        watch_username: "TheRoaringKitty".into(),
    }
}

fn temp_checkpoint() -> Checkpoint {
    let mut p = std::env::temp_dir();
    p.push(format!("tickertape_it_checkpoint_{}.txt", uuid::Uuid::new_v4()));
    Checkpoint::new(p)
}

struct Harness {
    browser: MockBrowser,
    publisher: RecordingPublisher,
    timeline: ScriptedTimeline,
    checkpoint: Checkpoint,
    pipeline: Pipeline,
}

impl Harness {
    fn new(btc_change: f64, filings: FixedFilings, settings: Settings) -> Self {
        let browser = MockBrowser::trading_day(&[
            ("NVDA", "$101.10", "-$4.40 (-4.17%) Overnight"),
            ("AMD", "$150.00", "+$1.50 (+1.01%)"),
            ("META", "$580.00", "-$17.94 (-3.00%) Overnight"),
            ("MSTR", "$23.45", "-$2.32 (-9.00%) Today"),
            ("COIN", "$210.00", "-$10.00 (-4.55%) Today"),
            ("GME", "$25.10", "+$2.10 (+9.13%) Today"),
            ("AMC", "$4.20", "+$0.10 (+2.44%) Today"),
        ]);
        let publisher = RecordingPublisher::new();
        let timeline = ScriptedTimeline::new("1800000000000000001");
        let checkpoint = temp_checkpoint();

        let deps = Deps {
            driver: Arc::new(browser.clone()),
            publisher: Arc::new(publisher.clone()),
            timeline: Some(Arc::new(timeline.clone())),
            crypto: Arc::new(FixedBitcoin(btc_change)),
            filings: Arc::new(filings),
            checkpoint: checkpoint.clone(),
        };
        let pipeline = Pipeline::new(deps, settings);
        Self { browser, publisher, timeline, checkpoint, pipeline }
    }

    fn standard() -> Self {
        Self::new(-6.2, FixedFilings::with(&["KD"]), settings())
    }

    async fn run(&self, kind: JobKind, now: NaiveDateTime) -> anyhow::Result<JobOutcome> {
        self.pipeline.run(&kind, now).await
    }

    fn assert_browser_released(&self) {
        assert_eq!(self.browser.launches(), self.browser.closes(), "every session closed");
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.checkpoint.clear();
    }
}

fn is_published(outcome: &JobOutcome) -> bool {
    matches!(outcome, JobOutcome::Published { .. })
}

// ---------------------------------------------------------------------------
// Earnings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_premarket_earnings_large_or_watched() {
    let h = Harness::standard();
    let outcome = h.run(JobKind::Earnings { session: ReportTime::BeforeOpen }, monday(4, 45)).await;
    assert!(is_published(&assert_ok!(outcome)));

    let posts = h.publisher.posts();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert!(post.starts_with("Major companies reporting earnings TODAY BEFORE the bell:"));
    assert!(post.contains("$TSN"), "above the market-cap floor");
    assert!(post.contains("$KD"), "on Monday's watchlist");
    assert!(!post.contains("$TINY"));
    assert!(!post.contains("$AAPL"), "reports after the close");
    assert_eq!(h.browser.launches(), 1);
    h.assert_browser_released();
}

#[tokio::test]
async fn test_afterhours_earnings() {
    let h = Harness::standard();
    let tuesday = monday(12, 0) + chrono::Duration::days(1);
    let outcome = h.run(JobKind::Earnings { session: ReportTime::AfterClose }, tuesday).await;
    assert_ok!(outcome);

    let posts = h.publisher.posts();
    assert!(posts[0].starts_with("Major companies reporting earnings TODAY AFTER the bell:"));
    assert!(posts[0].contains("$AAPL --->\n  EPS estimate: 1.62"));
    assert!(!posts[0].contains("$KD"));
}

// ---------------------------------------------------------------------------
// Calendar and movers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_econ_calendar_uses_weekly_view_on_sunday() {
    let h = Harness::standard();
    let sunday = monday(6, 0) - chrono::Duration::days(1);
    assert_ok!(h.run(JobKind::EconCalendar { view: None }, sunday).await);

    let posts = h.publisher.posts();
    assert!(posts[0].starts_with("Key economic events THIS WEEK:"));
    assert!(posts[0].contains("- 2026-10-19: Retail Sales MoM (F: 0.4% | P: 0.6%)"));
    h.assert_browser_released();
}

#[tokio::test]
async fn test_econ_calendar_explicit_view_omits_dates_for_single_day() {
    let h = Harness::standard();
    let view = Some(CalendarView::Tomorrow);
    assert_ok!(h.run(JobKind::EconCalendar { view }, monday(23, 0)).await);

    let posts = h.publisher.posts();
    assert!(posts[0].starts_with("Key economic events TOMORROW:"));
    assert!(posts[0].contains("- Retail Sales MoM (F: 0.4% | P: 0.6%)"));
}

#[tokio::test]
async fn test_movers_post() {
    let h = Harness::standard();
    let outcome = h.run(JobKind::Movers { page: MoverPage::PreMarketGainers }, monday(7, 0)).await;
    assert!(is_published(&assert_ok!(outcome)));

    let posts = h.publisher.posts();
    assert!(posts[0].starts_with("Top pre-market gainers:\n\n1. $SMCI +18.42%"));
    h.assert_browser_released();
}

#[tokio::test]
async fn test_empty_movers_page_stays_quiet() {
    let h = Harness::standard();
    h.browser.serve(
        tickertape::scrape::movers::mover_url(MoverPage::AllTimeLow),
        crate::mock_driver::movers_page(&[]),
    );
    let outcome = assert_ok!(h.run(JobKind::Movers { page: MoverPage::AllTimeLow }, monday(15, 51)).await);
    assert!(!is_published(&outcome));
    assert!(h.publisher.posts().is_empty());
}

// ---------------------------------------------------------------------------
// Quote-driven jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_overnight_drops_across_sectors() {
    let h = Harness::standard();
    assert_ok!(h.run(JobKind::Overnight, monday(20, 30)).await);

    let posts = h.publisher.posts();
    assert_eq!(
        posts[0],
        "Biggest overnight drops:\n\n1. $NVDA -4.17% (Semis)\n2. $META -3.00% (Big Tech)"
    );
    // NVDA, AMD and META read in one session.
    assert_eq!(h.browser.launches(), 1);
    h.assert_browser_released();
}

#[tokio::test]
async fn test_overnight_tolerates_missing_quote_page() {
    let h = Harness::standard();
    h.browser.serve(quote_url("NVDA"), "<html><body>Access denied</body></html>");
    assert_ok!(h.run(JobKind::Overnight, monday(20, 30)).await);

    let posts = h.publisher.posts();
    assert!(!posts[0].contains("$NVDA"));
    assert!(posts[0].contains("$META -3.00% (Big Tech)"));
}

#[tokio::test]
async fn test_crypto_watch_posts_on_big_move() {
    let h = Harness::standard();
    assert_ok!(h.run(JobKind::CryptoWatch, monday(9, 0)).await);

    let posts = h.publisher.posts();
    assert!(posts[0].starts_with("$BTC is down 6.20% in the last 24h ($67250)."));
    assert!(posts[0].contains("$MSTR $23.45 (-9.00%)"));
    assert!(posts[0].contains("$COIN"));
}

#[tokio::test]
async fn test_crypto_watch_small_move_skips_browser() {
    let h = Harness::new(2.0, FixedFilings::default(), settings());
    let outcome = assert_ok!(h.run(JobKind::CryptoWatch, monday(9, 0)).await);
    assert!(!is_published(&outcome));
    assert_eq!(h.browser.launches(), 0);
    assert!(h.publisher.posts().is_empty());
}

#[tokio::test]
async fn test_meme_watch_follows_new_posts() {
    let h = Harness::standard();

    let first = assert_ok!(h.run(JobKind::MemeWatch, monday(9, 35)).await);
    assert!(is_published(&first), "no checkpoint yet counts as new");
    let again = assert_ok!(h.run(JobKind::MemeWatch, monday(12, 30)).await);
    assert!(!is_published(&again));

    h.timeline.set_latest("1800000000000000002");
    let after_new = assert_ok!(h.run(JobKind::MemeWatch, monday(16, 5)).await);
    assert!(is_published(&after_new));

    let posts = h.publisher.posts();
    assert_eq!(posts.len(), 2);
    assert!(posts[0].starts_with("Meme stock check:\n\n$GME $25.10"));
    assert_eq!(h.checkpoint.load().unwrap().as_deref(), Some("1800000000000000002"));
}

// ---------------------------------------------------------------------------
// Filings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_filings_skip_failed_lookups() {
    let mut filings = FixedFilings::with(&["KD", "PLTR"]);
    filings.failing.push("KD".into());
    let h = Harness::new(-6.2, filings, settings());

    assert_ok!(h.run(JobKind::EarningsFilings, monday(17, 0)).await);
    let posts = h.publisher.posts();
    assert!(posts[0].starts_with("Latest earnings filings on EDGAR:\n\n$PLTR 10-Q (2026-10-19)"));
    assert!(!posts[0].contains("$KD"));
}

#[tokio::test]
async fn test_filings_placeholder_when_enabled() {
    let mut s = settings();
    s.post_placeholders = true;
    let h = Harness::new(-6.2, FixedFilings::default(), s);

    assert_ok!(h.run(JobKind::EarningsFilings, monday(17, 0)).await);
    assert_eq!(h.publisher.posts(), vec!["No recent earnings filings on EDGAR for today's reporters.".to_string()]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_publish_failure_propagates_and_releases_browser() {
    let h = Harness::standard();
    h.publisher.set_error("403 duplicate content");

    let err = assert_err!(h.run(JobKind::Movers { page: MoverPage::WeekHigh52 }, monday(15, 45)).await);
    assert!(format!("{err:#}").contains("403 duplicate content"));
    h.assert_browser_released();
}

#[tokio::test]
async fn test_browser_launch_failure_is_error() {
    let h = Harness::standard();
    h.browser.set_launch_failure(true);

    assert_err!(h.run(JobKind::Earnings { session: ReportTime::BeforeOpen }, monday(4, 45)).await);
    assert!(h.publisher.posts().is_empty());
}
