//! Test doubles for the pipeline's collaborators.
//!
//! `MockBrowser` serves canned HTML per URL and counts sessions so tests
//! can check that every launch is matched by a close. `RecordingPublisher`
//! keeps every post instead of sending it. The data-feed stubs return
//! fixed values.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickertape::data::{CryptoFeed, FilingLookup};
use tickertape::scrape::earnings::EARNINGS_URL;
use tickertape::scrape::econ::ECON_URL;
use tickertape::scrape::movers::mover_url;
use tickertape::scrape::quotes::quote_url;
use tickertape::scrape::{PageDriver, PageSession};
use tickertape::tweet::{PostReceipt, Publisher, TimelineReader};
use tickertape::types::{CryptoRecord, FilingRecord, MoverPage};

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

/// Fake browser backed by a URL → HTML map.
#[derive(Clone, Default)]
pub struct MockBrowser {
    pages: Arc<Mutex<HashMap<String, String>>>,
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    fail_launch: Arc<Mutex<bool>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`. Unknown URLs fail to load.
    pub fn serve(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.lock().unwrap().insert(url.into(), html.into());
    }

    /// Make every subsequent launch fail.
    pub fn set_launch_failure(&self, fail: bool) {
        *self.fail_launch.lock().unwrap() = fail;
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// A browser serving every page a full trading day needs.
    pub fn trading_day(quotes: &[(&str, &str, &str)]) -> Self {
        let browser = Self::new();
        browser.serve(EARNINGS_URL, earnings_page());
        browser.serve(ECON_URL, econ_page());
        for &page in MoverPage::ALL {
            browser.serve(mover_url(page), movers_page(&[("SMCI", "+18.42%"), ("NVDA", "−3.10%")]));
        }
        for (ticker, price, change) in quotes {
            browser.serve(quote_url(ticker), quote_page(price, change));
        }
        browser
    }
}

struct MockSession {
    browser: MockBrowser,
    current: Option<String>,
}

#[async_trait]
impl PageDriver for MockBrowser {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        if *self.fail_launch.lock().unwrap() {
            return Err(anyhow!("chrome not found"));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession { browser: self.clone(), current: None }))
    }
}

#[async_trait]
impl PageSession for MockSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        if !self.browser.pages.lock().unwrap().contains_key(url) {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn click(&mut self, _selector: &str) -> Result<()> {
        Ok(())
    }

    async fn html(&mut self) -> Result<String> {
        let url = self.current.as_ref().ok_or_else(|| anyhow!("no page loaded"))?;
        self.browser
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("page vanished: {url}"))
    }

    async fn close(&mut self) -> Result<()> {
        self.browser.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Publisher that records posts in memory.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    posts: Arc<Mutex<Vec<String>>>,
    force_error: Arc<Mutex<Option<String>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force all subsequent posts to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, text: &str) -> Result<PostReceipt> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        let mut posts = self.posts.lock().unwrap();
        posts.push(text.to_string());
        Ok(PostReceipt { id: format!("post-{}", posts.len()), text: text.to_string() })
    }
}

// ---------------------------------------------------------------------------
// Data feeds
// ---------------------------------------------------------------------------

pub struct FixedBitcoin(pub f64);

#[async_trait]
impl CryptoFeed for FixedBitcoin {
    async fn bitcoin(&self) -> Result<CryptoRecord> {
        Ok(CryptoRecord { ticker: "BTC".into(), price: 67250.0, change_24h_pct: self.0 })
    }
}

/// Filings keyed by ticker; tickers listed in `failing` error out.
#[derive(Default)]
pub struct FixedFilings {
    pub filings: HashMap<String, FilingRecord>,
    pub failing: Vec<String>,
}

impl FixedFilings {
    pub fn with(tickers: &[&str]) -> Self {
        let filings = tickers
            .iter()
            .map(|t| {
                let record = FilingRecord {
                    ticker: t.to_string(),
                    cik: "0000320193".into(),
                    form: "10-Q".into(),
                    filed: "2026-10-19".into(),
                    url: format!("https://www.sec.gov/Archives/edgar/data/320193/{t}/q3.htm"),
                };
                (t.to_string(), record)
            })
            .collect();
        Self { filings, failing: Vec::new() }
    }
}

#[async_trait]
impl FilingLookup for FixedFilings {
    async fn latest_earnings_filing(&self, ticker: &str) -> Result<Option<FilingRecord>> {
        if self.failing.iter().any(|t| t == ticker) {
            return Err(anyhow!("EDGAR returned 503 for {ticker}"));
        }
        Ok(self.filings.get(ticker).cloned())
    }
}

/// Timeline whose latest post id can be changed between runs.
#[derive(Clone, Default)]
pub struct ScriptedTimeline {
    latest: Arc<Mutex<Option<String>>>,
}

impl ScriptedTimeline {
    pub fn new(latest: &str) -> Self {
        let timeline = Self::default();
        timeline.set_latest(latest);
        timeline
    }

    pub fn set_latest(&self, id: &str) {
        *self.latest.lock().unwrap() = Some(id.to_string());
    }
}

#[async_trait]
impl TimelineReader for ScriptedTimeline {
    async fn user_id(&self, _username: &str) -> Result<Option<String>> {
        Ok(Some("44196397".into()))
    }

    async fn latest_post_id(&self, _user_id: &str) -> Result<Option<String>> {
        Ok(self.latest.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// HTML fixtures
// ---------------------------------------------------------------------------

pub fn earnings_page() -> String {
    r#"<html><body><table class="tv-data-table"><tbody>
      <tr class="tv-data-table__row">
        <td data-field-key="name"><a>AAPL</a><span>Apple Inc.</span></td>
        <td data-field-key="market_cap_basic">2.87&#8239;T USD</td>
        <td data-field-key="earnings_per_share_forecast_next_fq">1.62 USD</td>
        <td data-field-key="revenue_forecast_next_fq">94.36&#8239;B USD</td>
        <td data-field-key="earnings_release_next_time" title="After Close"></td>
      </tr>
      <tr class="tv-data-table__row">
        <td data-field-key="name"><a>TSN</a><span>Tyson Foods</span></td>
        <td data-field-key="market_cap_basic">21.4&#8239;B USD</td>
        <td data-field-key="earnings_per_share_forecast_next_fq">0.88 USD</td>
        <td data-field-key="revenue_forecast_next_fq">13.4&#8239;B USD</td>
        <td data-field-key="earnings_release_next_time" title="Before Open"></td>
      </tr>
      <tr class="tv-data-table__row">
        <td data-field-key="name"><a>TINY</a><span>Tiny Corp</span></td>
        <td data-field-key="market_cap_basic">120&#8239;M USD</td>
        <td data-field-key="earnings_per_share_forecast_next_fq">0.01 USD</td>
        <td data-field-key="earnings_release_next_time" title="Before Open"></td>
      </tr>
      <tr class="tv-data-table__row">
        <td data-field-key="name"><a>KD</a><span>Kyndryl</span></td>
        <td data-field-key="market_cap_basic">800&#8239;M USD</td>
        <td data-field-key="earnings_per_share_forecast_next_fq">0.30 USD</td>
        <td data-field-key="revenue_forecast_next_fq">3.7&#8239;B USD</td>
        <td data-field-key="earnings_release_next_time" title="Before Open"></td>
      </tr>
    </tbody></table></body></html>"#
        .to_string()
}

pub fn econ_page() -> String {
    r#"<html><body><div id="js-category-content">
      <div data-name="economic-calendar-item-1">
        <time datetime="2026-10-19">Mon, Oct 19</time>
        <span class="titleText-abc">Retail Sales MoM</span>
        <span class="valueWithUnit-x">0.4%</span>
        <span class="valueWithUnit-x">0.6%</span>
      </div>
      <div data-name="economic-calendar-item-2">
        <span class="titleText-abc">Fed Chair Speech</span>
      </div>
    </div></body></html>"#
        .to_string()
}

pub fn movers_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(t, c)| format!("<tr><td><span>{t}</span></td><td><span>{c}</span></td></tr>"))
        .collect();
    format!(
        r#"<html><body><div class="tv-category-content"><table><tbody>{body}</tbody></table></div></body></html>"#
    )
}

pub fn quote_page(price: &str, change: &str) -> String {
    format!(
        r#"<html><body>
             <div id="sdp-market-price">{price}</div>
             <div id="sdp-price-chart-price-change">{change}</div>
           </body></html>"#
    )
}
