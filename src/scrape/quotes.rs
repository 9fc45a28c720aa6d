//! Robinhood quote pages, used for overnight and live stock prices.
//!
//! Page: `https://robinhood.com/us/en/stocks/{TICKER}/`
//! One browser session visits every requested ticker in turn; a ticker
//! that fails to load is skipped and the rest are still read.

use anyhow::Result;
use scraper::Html;
use std::time::Duration;

use super::normalize::{or_na, parse_change_pct};
use super::{css, release, PageDriver};
use crate::types::{BotError, Extraction, QuoteRecord};

const QUOTE_HOST: &str = "https://robinhood.com";
const PRICE: &str = "#sdp-market-price";
const CHANGE: &str = "#sdp-price-chart-price-change";

/// Session labels Robinhood appends to prices and changes.
const LABELS: &[&str] = &["Overnight", "After-hours", "After hours", "Pre-market", "Today"];

pub fn quote_url(ticker: &str) -> String {
    format!("{QUOTE_HOST}/us/en/stocks/{ticker}/")
}

fn strip_labels(text: &str) -> String {
    let mut out = text.to_string();
    for label in LABELS {
        out = out.replace(label, "");
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the quote shown on one rendered ticker page.
pub fn parse_quote_page(idx: usize, ticker: &str, html: &str) -> Extraction<QuoteRecord> {
    let (price_sel, change_sel) = match (css(PRICE), css(CHANGE)) {
        (Ok(p), Ok(c)) => (p, c),
        (Err(e), _) | (_, Err(e)) => return Extraction::skipped(idx, e.to_string()),
    };
    let doc = Html::parse_document(html);

    // Digits are rendered in separate spans, so concatenate without separators.
    let price = doc
        .select(&price_sel)
        .next()
        .map(|el| strip_labels(&el.text().collect::<String>()))
        .filter(|p| !p.is_empty());
    let Some(price) = price else {
        return Extraction::skipped(idx, format!("{ticker}: price not found"));
    };

    let change = doc
        .select(&change_sel)
        .next()
        .map(|el| strip_labels(&el.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default();
    let change = or_na(change);
    let change_pct = parse_change_pct(&change);

    Extraction::Extracted(QuoteRecord {
        ticker: ticker.to_string(),
        price,
        change,
        change_pct,
    })
}

/// Read quotes for `tickers` in one browser session.
pub async fn fetch_quotes(
    driver: &dyn PageDriver,
    tickers: &[String],
    timeout: Duration,
) -> Result<Vec<Extraction<QuoteRecord>>> {
    if tickers.is_empty() {
        return Ok(Vec::new());
    }

    let mut session = driver
        .launch()
        .await
        .map_err(|e| BotError::fetch(QUOTE_HOST, format!("browser launch failed: {e}")))?;

    let mut rows = Vec::with_capacity(tickers.len());
    for (idx, ticker) in tickers.iter().enumerate() {
        let url = quote_url(ticker);
        let page = async {
            session.goto(&url).await?;
            session.wait_for(PRICE, timeout).await?;
            session.html().await
        }
        .await;

        rows.push(match page {
            Ok(html) => parse_quote_page(idx, ticker, &html),
            Err(e) => Extraction::skipped(idx, format!("{ticker}: {e}")),
        });
    }

    release(session, QUOTE_HOST).await;
    Ok(rows)
}
