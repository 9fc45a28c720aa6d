//! Page scraping.
//!
//! Defines the `PageDriver` / `PageSession` traits that abstract the
//! browser-automation collaborator, plus the per-site row extractors.
//! Extractors are pure functions over rendered HTML so they can be tested
//! against fixtures; the `fetch_*` wrappers own the session lifecycle.

pub mod browser;
pub mod earnings;
pub mod econ;
pub mod movers;
pub mod normalize;
pub mod quotes;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{BotError, Extraction};

/// Abstraction over a browser-automation backend.
///
/// Every call to `launch` yields an independent session; sessions are
/// never shared across job invocations.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSession>>;
}

/// One live browser tab.
///
/// Callers must `close` the session on every exit path; `open_page` and
/// `release` take care of that for the scrapers in this module.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to `url`.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until an element matching `selector` is present.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Scroll the first element matching `selector` into view and click it.
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Current rendered document.
    async fn html(&mut self) -> Result<String>;

    /// Release the tab and its browser.
    async fn close(&mut self) -> Result<()>;
}

/// Launch a session, navigate to `url` and wait for `ready`.
///
/// On failure the session is released before the error is returned.
pub async fn open_page(
    driver: &dyn PageDriver,
    url: &str,
    ready: &str,
    timeout: Duration,
) -> Result<Box<dyn PageSession>> {
    let mut session = driver
        .launch()
        .await
        .map_err(|e| BotError::fetch(url, format!("browser launch failed: {e}")))?;

    let loaded = async {
        session.goto(url).await?;
        session.wait_for(ready, timeout).await
    }
    .await;

    match loaded {
        Ok(()) => {
            debug!(url, "Page ready");
            Ok(session)
        }
        Err(e) => {
            release(session, url).await;
            Err(BotError::fetch(url, e).into())
        }
    }
}

/// Close a session, logging (not propagating) a failure to do so.
pub async fn release(mut session: Box<dyn PageSession>, url: &str) {
    if let Err(e) = session.close().await {
        warn!(url, error = %e, "Failed to close browser session");
    }
}

/// Keep the extracted rows and log every skipped one.
pub fn collect_rows<T>(site: &str, rows: Vec<Extraction<T>>) -> Vec<T> {
    let total = rows.len();
    let mut kept = Vec::with_capacity(total);
    for row in rows {
        match row {
            Extraction::Extracted(record) => kept.push(record),
            Extraction::Skipped { row, reason } => {
                let err = BotError::PartialExtraction { row, reason };
                warn!(site, error = %err, "Row dropped");
            }
        }
    }
    debug!(site, total, kept = kept.len(), "Rows extracted");
    kept
}

/// Compile a CSS selector.
pub(crate) fn css(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid CSS selector {selector:?}: {e:?}"))
}

/// Rendered text of an element: non-empty text nodes, trimmed, one per line.
pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the first descendant of `el` matching `selector`.
pub(crate) fn first_text(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector).next().map(cell_text)
}
