//! SEC EDGAR filings provider.
//!
//! Ticker map: `https://www.sec.gov/files/company_tickers.json`
//! Filings:    `https://data.sec.gov/submissions/CIK##########.json`
//! Auth: none, but the SEC rejects requests without a declared
//! `User-Agent` naming a contact. Fair access limit: 10 req/s.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::FilingLookup;
use crate::types::{BotError, FilingRecord};

/// Form types treated as earnings reports, in no particular priority.
const EARNINGS_FORMS: &[&str] = &["10-Q", "8-K"];

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TickerEntry {
    cik_str: u64,
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct Submissions {
    filings: Filings,
}

#[derive(Debug, Deserialize)]
struct Filings {
    recent: RecentFilings,
}

/// Column-oriented: index `i` of every vector describes the same filing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    accession_number: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    form: Vec<String>,
    primary_document: Vec<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct EdgarClient {
    http: Client,
    www_base: String,
    data_base: String,
    /// Ticker → CIK, refreshed once per day.
    ciks: Mutex<Option<(NaiveDate, HashMap<String, u64>)>>,
}

impl EdgarClient {
    pub fn new(www_base: &str, data_base: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client for EDGAR")?;

        Ok(Self {
            http,
            www_base: www_base.trim_end_matches('/').to_string(),
            data_base: data_base.trim_end_matches('/').to_string(),
            ciks: Mutex::new(None),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        debug!(url, "EDGAR GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::fetch(url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(BotError::fetch(url, format!("HTTP {status}")).into());
        }
        resp.json()
            .await
            .with_context(|| format!("Failed to parse EDGAR response from {url}"))
    }

    /// Ten-digit CIK for `ticker`, `None` if the SEC does not list it.
    pub async fn cik(&self, ticker: &str) -> Result<Option<String>> {
        let today = Local::now().date_naive();
        let mut cache = self.ciks.lock().await;
        let stale = !matches!(&*cache, Some((day, _)) if *day == today);
        if stale {
            let url = format!("{}/files/company_tickers.json", self.www_base);
            let entries: HashMap<String, TickerEntry> = self.get(&url).await?;
            let map = entries
                .into_values()
                .map(|e| (e.ticker.to_uppercase(), e.cik_str))
                .collect::<HashMap<_, _>>();
            info!(tickers = map.len(), "EDGAR ticker map loaded");
            *cache = Some((today, map));
        }

        Ok(cache
            .as_ref()
            .and_then(|(_, map)| map.get(&ticker.to_uppercase()))
            .map(|cik| pad_cik(*cik)))
    }
}

/// Zero-pad a CIK to the ten digits the submissions API expects.
pub fn pad_cik(cik: u64) -> String {
    format!("{cik:010}")
}

/// Archive URL of a filing's primary document under `www_base`.
pub fn filing_url(www_base: &str, cik: &str, accession: &str, document: &str) -> String {
    let cik_int = cik.trim_start_matches('0');
    let accession = accession.replace('-', "");
    format!("{www_base}/Archives/edgar/data/{cik_int}/{accession}/{document}")
}

fn first_earnings_filing(
    www_base: &str,
    ticker: &str,
    cik: &str,
    recent: &RecentFilings,
) -> Option<FilingRecord> {
    let idx = recent
        .form
        .iter()
        .position(|f| EARNINGS_FORMS.contains(&f.as_str()))?;
    let accession = recent.accession_number.get(idx)?;
    let document = recent.primary_document.get(idx)?;
    Some(FilingRecord {
        ticker: ticker.to_uppercase(),
        cik: cik.to_string(),
        form: recent.form[idx].clone(),
        filed: recent.filing_date.get(idx).cloned().unwrap_or_default(),
        url: filing_url(www_base, cik, accession, document),
    })
}

#[async_trait]
impl FilingLookup for EdgarClient {
    async fn latest_earnings_filing(&self, ticker: &str) -> Result<Option<FilingRecord>> {
        let Some(cik) = self.cik(ticker).await? else {
            warn!(ticker, "No CIK found, skipping");
            return Ok(None);
        };

        let url = format!("{}/submissions/CIK{cik}.json", self.data_base);
        let submissions: Submissions = self.get(&url).await?;
        let filing = first_earnings_filing(&self.www_base, ticker, &cik, &submissions.filings.recent);
        match &filing {
            Some(f) => info!(ticker, form = %f.form, url = %f.url, "Earnings filing found"),
            None => debug!(ticker, "No 10-Q or 8-K among recent filings"),
        }
        Ok(filing)
    }
}
