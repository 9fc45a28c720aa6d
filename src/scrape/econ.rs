//! TradingView economic calendar.
//!
//! Page: `https://www.tradingview.com/symbols/USDCAD/economic-calendar/?exchange=FX_IDC`
//!
//! The calendar is filtered to high-importance events and switched to the
//! requested `CalendarView` before the rows are read. Each event row holds a
//! title and up to two value cells (forecast, prior).

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

use super::normalize::clean_value;
use super::{cell_text, css, first_text, open_page, release, PageDriver};
use crate::types::{BotError, CalendarView, EconRecord, Extraction, NOT_AVAILABLE};

pub const ECON_URL: &str =
    "https://www.tradingview.com/symbols/USDCAD/economic-calendar/?exchange=FX_IDC";

const CONTAINER: &str = "#js-category-content";
const ROW: &str = "div[data-name*='economic-calendar-item']";
const TITLE: &str = "span[class*='titleText']";
const VALUE: &str = "span[class*='valueWithUnit']";
const DATE: &str = "time, [class*='dateTime']";
const IMPORTANCE_FILTER: &str = "#js-category-content button[data-name='importance-filter']";

/// Pause after clicking a filter so the list can re-render.
const SETTLE: Duration = Duration::from_millis(1500);

/// Extract every event row of a rendered economic calendar.
pub fn parse_econ_calendar(html: &str) -> Result<Vec<Extraction<EconRecord>>> {
    let doc = Html::parse_document(html);
    let row_sel = css(ROW)?;
    let title = css(TITLE)?;
    let value = css(VALUE)?;
    let date = css(DATE)?;

    let mut seen = HashSet::new();
    let rows = doc
        .select(&row_sel)
        .enumerate()
        .map(|(idx, row)| match extract_row(idx, row, &title, &value, &date) {
            // The same event can be listed twice when the page re-renders mid-read.
            Extraction::Extracted(rec)
                if !seen.insert((rec.event.clone(), rec.date.clone())) =>
            {
                Extraction::skipped(idx, format!("duplicate event {:?}", rec.event))
            }
            other => other,
        })
        .collect();
    Ok(rows)
}

fn extract_row(
    idx: usize,
    row: ElementRef<'_>,
    title: &Selector,
    value: &Selector,
    date: &Selector,
) -> Extraction<EconRecord> {
    let event = match first_text(row, title) {
        Some(t) if !t.is_empty() => t.replace('\n', " "),
        _ => return Extraction::skipped(idx, "event title not found"),
    };

    let values: Vec<String> = row.select(value).map(|el| clean_value(&cell_text(el))).collect();
    let forecast = values.first().cloned().unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let prior = values.get(1).cloned().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let date = row
        .select(date)
        .next()
        .map(|el| {
            el.value()
                .attr("datetime")
                .map(str::to_string)
                .unwrap_or_else(|| cell_text(el))
        })
        .filter(|d| !d.is_empty());

    Extraction::Extracted(EconRecord { event, forecast, prior, date })
}

/// Load the calendar, apply the importance filter and `view`, and extract rows.
///
/// A failed importance click is tolerated (all events are then listed);
/// a failed view click is not, since the rows would be for the wrong dates.
pub async fn fetch_econ_calendar(
    driver: &dyn PageDriver,
    view: CalendarView,
    timeout: Duration,
) -> Result<Vec<Extraction<EconRecord>>> {
    let mut session = open_page(driver, ECON_URL, CONTAINER, timeout).await?;

    let rendered = async {
        if let Err(e) = session.click(IMPORTANCE_FILTER).await {
            warn!(error = %e, "Importance filter not applied, listing all events");
        } else {
            tokio::time::sleep(SETTLE).await;
        }
        session
            .click(view.tab_selector())
            .await
            .with_context(|| format!("Could not switch calendar to {view}"))?;
        tokio::time::sleep(SETTLE).await;
        session.wait_for(CONTAINER, timeout).await?;
        session.html().await
    }
    .await;

    release(session, ECON_URL).await;
    let html = rendered.map_err(|e| BotError::fetch(ECON_URL, format!("{e:#}")))?;
    parse_econ_calendar(&html)
}
