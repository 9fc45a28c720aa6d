//! TradingView earnings calendar.
//!
//! Page: `https://www.tradingview.com/markets/stocks-usa/earnings/`
//! Rows are `.tv-data-table__row`; each cell carries a `data-field-key`
//! naming the column.

use anyhow::Result;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::time::Duration;

use super::normalize::{clean_ticker, clean_value, parse_market_cap};
use super::{css, first_text, open_page, release, PageDriver};
use crate::types::{EarningsRecord, Extraction, ReportTime};

pub const EARNINGS_URL: &str = "https://www.tradingview.com/markets/stocks-usa/earnings/";

const TABLE: &str = ".tv-data-table";
const ROW: &str = ".tv-data-table__row";
const TICKER: &str = "[data-field-key='name']";
const MARKET_CAP: &str = "[data-field-key='market_cap_basic']";
const EPS: &str = "[data-field-key='earnings_per_share_forecast_next_fq']";
const REVENUE: &str = "[data-field-key='revenue_forecast_next_fq']";
const TIME: &str = "[data-field-key='earnings_release_next_time']";

/// Extract every row of a rendered earnings calendar.
pub fn parse_earnings_table(html: &str) -> Result<Vec<Extraction<EarningsRecord>>> {
    let doc = Html::parse_document(html);
    let row_sel = css(ROW)?;
    let fields = Fields {
        ticker: css(TICKER)?,
        market_cap: css(MARKET_CAP)?,
        eps: css(EPS)?,
        revenue: css(REVENUE)?,
        time: css(TIME)?,
    };

    let mut seen = HashSet::new();
    let rows = doc
        .select(&row_sel)
        .enumerate()
        .map(|(idx, row)| match fields.extract(idx, row) {
            Extraction::Extracted(rec) if !seen.insert(rec.ticker.clone()) => {
                Extraction::skipped(idx, format!("duplicate ticker {}", rec.ticker))
            }
            other => other,
        })
        .collect();
    Ok(rows)
}

struct Fields {
    ticker: scraper::Selector,
    market_cap: scraper::Selector,
    eps: scraper::Selector,
    revenue: scraper::Selector,
    time: scraper::Selector,
}

impl Fields {
    fn extract(&self, idx: usize, row: ElementRef<'_>) -> Extraction<EarningsRecord> {
        let Some(raw_ticker) = first_text(row, &self.ticker) else {
            return Extraction::skipped(idx, "ticker cell not found");
        };
        let Some(ticker) = clean_ticker(&raw_ticker) else {
            return Extraction::skipped(idx, format!("unusable ticker text {raw_ticker:?}"));
        };

        let market_cap = clean_value(&first_text(row, &self.market_cap).unwrap_or_default());
        let market_cap_value = parse_market_cap(&market_cap);

        // The time column is an icon; its label lives in the title attribute.
        let time = row
            .select(&self.time)
            .next()
            .map(|el| {
                el.value()
                    .attr("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| super::cell_text(el))
            })
            .map(|label| ReportTime::from_label(&label))
            .unwrap_or(ReportTime::Unspecified);

        Extraction::Extracted(EarningsRecord {
            ticker,
            eps_estimate: clean_value(&first_text(row, &self.eps).unwrap_or_default()),
            revenue_forecast: clean_value(&first_text(row, &self.revenue).unwrap_or_default()),
            market_cap,
            market_cap_value,
            time,
        })
    }
}

/// Load the earnings calendar and extract its rows.
pub async fn fetch_earnings(
    driver: &dyn PageDriver,
    timeout: Duration,
) -> Result<Vec<Extraction<EarningsRecord>>> {
    let mut session = open_page(driver, EARNINGS_URL, TABLE, timeout).await?;
    let html = session.html().await;
    release(session, EARNINGS_URL).await;
    parse_earnings_table(&html?)
}
