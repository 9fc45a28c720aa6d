//! TradingView market-movers tables (pre-market gainers/losers/gappers,
//! 52-week and all-time highs/lows).
//!
//! All pages share one layout: a table under `.tv-category-content` with
//! the symbol in the first column and the percent change in the second.

use anyhow::Result;
use scraper::Html;
use std::collections::HashSet;
use std::time::Duration;

use super::normalize::{clean_ticker, clean_value, parse_percent};
use super::{css, first_text, open_page, release, PageDriver};
use crate::types::{Extraction, MoverPage, MoverRecord};

const BASE_URL: &str = "https://www.tradingview.com/markets/stocks-usa";

const READY: &str = ".tv-category-content";
const ROW: &str = ".tv-category-content table tbody tr";
const TICKER: &str = "td:nth-child(1) span";
const CHANGE: &str = "td:nth-child(2) span";

/// Full URL of a movers page.
pub fn mover_url(page: MoverPage) -> String {
    format!("{BASE_URL}/{}/", page.slug())
}

/// Extract every row of a rendered movers table.
pub fn parse_movers_table(html: &str) -> Result<Vec<Extraction<MoverRecord>>> {
    let doc = Html::parse_document(html);
    let row_sel = css(ROW)?;
    let ticker_sel = css(TICKER)?;
    let change_sel = css(CHANGE)?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for (idx, row) in doc.select(&row_sel).enumerate() {
        let Some(raw) = first_text(row, &ticker_sel) else {
            rows.push(Extraction::skipped(idx, "ticker cell not found"));
            continue;
        };
        let Some(ticker) = clean_ticker(&raw) else {
            rows.push(Extraction::skipped(idx, format!("unusable ticker text {raw:?}")));
            continue;
        };
        if !seen.insert(ticker.clone()) {
            rows.push(Extraction::skipped(idx, format!("duplicate ticker {ticker}")));
            continue;
        }

        let change = clean_value(&first_text(row, &change_sel).unwrap_or_default());
        let change_pct = parse_percent(&change);
        rows.push(Extraction::Extracted(MoverRecord { ticker, change, change_pct }));
    }
    Ok(rows)
}

/// Load one movers page and extract its rows.
pub async fn fetch_movers(
    driver: &dyn PageDriver,
    page: MoverPage,
    timeout: Duration,
) -> Result<Vec<Extraction<MoverRecord>>> {
    let url = mover_url(page);
    let mut session = open_page(driver, &url, READY, timeout).await?;
    let html = session.html().await;
    release(session, &url).await;
    parse_movers_table(&html?)
}
