//! Shared types for the TICKERTAPE bot.
//!
//! Records produced by the scrapers, the enums that steer each job
//! (report session, calendar view, mover page), and the domain error
//! taxonomy. Records live for one pipeline run and are never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal rendered in place of any field the page did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of the earnings calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub ticker: String,
    pub eps_estimate: String,
    pub revenue_forecast: String,
    /// Market cap as shown on the page ("2.87T", "N/A").
    pub market_cap: String,
    /// Parsed market cap in USD; 0 when unknown.
    pub market_cap_value: f64,
    pub time: ReportTime,
}

/// One row of a market-movers table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoverRecord {
    pub ticker: String,
    /// Change exactly as shown ("+12.34%", "−3.10%").
    pub change: String,
    /// Signed percent change; `None` when the cell could not be parsed.
    pub change_pct: Option<f64>,
}

/// One event on the economic calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconRecord {
    pub event: String,
    pub forecast: String,
    pub prior: String,
    pub date: Option<String>,
}

/// Spot price and 24h move of a cryptocurrency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoRecord {
    pub ticker: String,
    pub price: f64,
    /// Signed 24h change in percent.
    pub change_24h_pct: f64,
}

/// Live or overnight quote of a single stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub ticker: String,
    /// Price as displayed ("$23.45").
    pub price: String,
    /// Change as displayed ("+$1.23 (+2.45%)").
    pub change: String,
    pub change_pct: Option<f64>,
}

/// Latest periodic/current report filed with the SEC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub ticker: String,
    /// Ten-digit zero-padded CIK.
    pub cik: String,
    pub form: String,
    pub filed: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Row extraction outcome
// ---------------------------------------------------------------------------

/// Result of extracting one table row. A skipped row never aborts the scrape.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Extracted(T),
    Skipped { row: usize, reason: String },
}

impl<T> Extraction<T> {
    pub fn skipped(row: usize, reason: impl Into<String>) -> Self {
        Extraction::Skipped { row, reason: reason.into() }
    }

    /// The extracted record, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Extraction::Extracted(v) => Some(v),
            Extraction::Skipped { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// When a company reports relative to the regular session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTime {
    BeforeOpen,
    AfterClose,
    Unspecified,
}

impl ReportTime {
    /// Classify the label shown in the calendar's time column.
    pub fn from_label(label: &str) -> Self {
        let l = label.to_lowercase();
        if l.contains("before") || l.contains("pre-market") {
            ReportTime::BeforeOpen
        } else if l.contains("after") || l.contains("post-market") {
            ReportTime::AfterClose
        } else {
            ReportTime::Unspecified
        }
    }
}

impl fmt::Display for ReportTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportTime::BeforeOpen => write!(f, "Before Open"),
            ReportTime::AfterClose => write!(f, "After Close"),
            ReportTime::Unspecified => write!(f, "Unspecified"),
        }
    }
}

/// Date range shown by the economic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
}

impl CalendarView {
    /// CSS selector of the tab that switches the calendar to this view.
    pub fn tab_selector(&self) -> &'static str {
        match self {
            CalendarView::Today => r#"[id="Today"]"#,
            CalendarView::Tomorrow => r#"[id="Tomorrow"]"#,
            CalendarView::ThisWeek => r#"[id="This week"]"#,
            CalendarView::NextWeek => r#"[id="Next week"]"#,
        }
    }

    /// Whether the view spans several days (rows then carry a date).
    pub fn is_weekly(&self) -> bool {
        matches!(self, CalendarView::ThisWeek | CalendarView::NextWeek)
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarView::Today => write!(f, "Today"),
            CalendarView::Tomorrow => write!(f, "Tomorrow"),
            CalendarView::ThisWeek => write!(f, "This Week"),
            CalendarView::NextWeek => write!(f, "Next Week"),
        }
    }
}

/// TradingView market-movers table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoverPage {
    PreMarketGainers,
    PreMarketLosers,
    PreMarketGappers,
    WeekHigh52,
    WeekLow52,
    AllTimeHigh,
    AllTimeLow,
}

impl MoverPage {
    pub const ALL: &'static [MoverPage] = &[
        MoverPage::PreMarketGainers,
        MoverPage::PreMarketLosers,
        MoverPage::PreMarketGappers,
        MoverPage::WeekHigh52,
        MoverPage::WeekLow52,
        MoverPage::AllTimeHigh,
        MoverPage::AllTimeLow,
    ];

    /// Path segment under `/markets/stocks-usa/`.
    pub fn slug(&self) -> &'static str {
        match self {
            MoverPage::PreMarketGainers => "market-movers-pre-market-gainers",
            MoverPage::PreMarketLosers => "market-movers-pre-market-losers",
            MoverPage::PreMarketGappers => "market-movers-pre-market-gappers",
            MoverPage::WeekHigh52 => "market-movers-52wk-high",
            MoverPage::WeekLow52 => "market-movers-52wk-low",
            MoverPage::AllTimeHigh => "market-movers-ath",
            MoverPage::AllTimeLow => "market-movers-atl",
        }
    }
}

impl fmt::Display for MoverPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoverPage::PreMarketGainers => write!(f, "Pre-Market Gainers"),
            MoverPage::PreMarketLosers => write!(f, "Pre-Market Losers"),
            MoverPage::PreMarketGappers => write!(f, "Pre-Market Gappers"),
            MoverPage::WeekHigh52 => write!(f, "52-Week Highs"),
            MoverPage::WeekLow52 => write!(f, "52-Week Lows"),
            MoverPage::AllTimeHigh => write!(f, "All-Time Highs"),
            MoverPage::AllTimeLow => write!(f, "All-Time Lows"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types. All of them are recovered below the
/// dispatch loop; none may stop the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Fetch failed ({target}): {message}")]
    TransientFetch { target: String, message: String },

    #[error("Row {row} skipped: {reason}")]
    PartialExtraction { row: usize, reason: String },

    #[error("Unparsable {field}: {value:?}")]
    Format { field: String, value: String },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BotError {
    pub fn fetch(target: impl Into<String>, err: impl fmt::Display) -> Self {
        BotError::TransientFetch {
            target: target.into(),
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
