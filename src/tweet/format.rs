//! Post templates.
//!
//! Every function returns the full post text. Empty input yields a short
//! placeholder so callers never publish an empty string. List posts keep
//! the first `LIST_LIMIT` records in the order given.

use std::fmt::Write as _;

use super::MAX_POST_CHARS;
use crate::filter::Labeled;
use crate::types::{
    CalendarView, CryptoRecord, EarningsRecord, EconRecord, FilingRecord, MoverPage,
    MoverRecord, QuoteRecord, NOT_AVAILABLE,
};

/// Maximum number of records listed in one post.
pub const LIST_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Earnings
// ---------------------------------------------------------------------------

pub fn premarket_earnings(records: &[EarningsRecord]) -> String {
    if records.is_empty() {
        return "No major earnings reports scheduled for today before the bell.".to_string();
    }
    earnings_post("Major companies reporting earnings TODAY BEFORE the bell:", records)
}

pub fn afterhours_earnings(records: &[EarningsRecord]) -> String {
    if records.is_empty() {
        return "No major earnings reports scheduled for today after the bell.".to_string();
    }
    earnings_post("Major companies reporting earnings TODAY AFTER the bell:", records)
}

/// Records are added whole while the post still fits `MAX_POST_CHARS`.
fn earnings_post(headline: &str, records: &[EarningsRecord]) -> String {
    let mut post = headline.to_string();
    let mut used = post.chars().count();
    for r in records {
        let block = format!(
            "\n\n- ${} --->\n  EPS estimate: {}\n  Revenue estimate: {}",
            r.ticker,
            na(&r.eps_estimate),
            na(&r.revenue_forecast)
        );
        let cost = block.chars().count();
        if used + cost > MAX_POST_CHARS {
            break;
        }
        post.push_str(&block);
        used += cost;
    }
    post
}

// ---------------------------------------------------------------------------
// Economic calendar
// ---------------------------------------------------------------------------

pub fn econ_calendar(view: CalendarView, events: &[EconRecord]) -> String {
    let span = match view {
        CalendarView::Today => "today",
        CalendarView::Tomorrow => "tomorrow",
        CalendarView::ThisWeek => "this week",
        CalendarView::NextWeek => "next week",
    };
    if events.is_empty() {
        return format!("No major economic events scheduled {span}.");
    }

    let mut post = format!("Key economic events {}:\n\n", span.to_uppercase());
    for e in events.iter().take(LIST_LIMIT) {
        post.push_str("- ");
        if view.is_weekly() {
            if let Some(date) = &e.date {
                let _ = write!(post, "{date}: ");
            }
        }
        let _ = writeln!(
            post,
            "{} (F: {} | P: {})",
            e.event,
            na(&e.forecast),
            na(&e.prior)
        );
    }
    post.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Market movers
// ---------------------------------------------------------------------------

pub fn movers(page: MoverPage, records: &[MoverRecord]) -> String {
    if records.is_empty() {
        return format!("No {} to report right now.", page.to_string().to_lowercase());
    }
    let headline = match page {
        MoverPage::PreMarketGainers => "Top pre-market gainers",
        MoverPage::PreMarketLosers => "Top pre-market losers",
        MoverPage::PreMarketGappers => "Biggest pre-market gaps",
        MoverPage::WeekHigh52 => "Stocks hitting 52-week highs",
        MoverPage::WeekLow52 => "Stocks hitting 52-week lows",
        MoverPage::AllTimeHigh => "Stocks at all-time highs",
        MoverPage::AllTimeLow => "Stocks at all-time lows",
    };

    let mut post = format!("{headline}:\n\n");
    for (i, r) in records.iter().take(LIST_LIMIT).enumerate() {
        let change = match r.change_pct {
            Some(pct) => signed_pct(pct),
            None => na(&r.change).to_string(),
        };
        let _ = writeln!(post, "{}. ${} {change}", i + 1, r.ticker);
    }
    post.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Quote-based posts
// ---------------------------------------------------------------------------

/// Bitcoin moved past the alert threshold; list the crypto-linked stocks.
pub fn btc_move(btc: &CryptoRecord, stocks: &[Labeled<QuoteRecord>]) -> String {
    let direction = if btc.change_24h_pct >= 0.0 { "up" } else { "down" };
    let mut post = format!(
        "$BTC is {direction} {:.2}% in the last 24h (${:.0}).\n\n",
        btc.change_24h_pct.abs(),
        btc.price
    );
    if stocks.is_empty() {
        post.push_str("Crypto stock quotes unavailable right now.");
        return post;
    }
    post.push_str("Crypto stocks:\n");
    for l in stocks.iter().take(LIST_LIMIT) {
        let _ = writeln!(post, "{}", quote_line(&l.record));
    }
    post.trim_end().to_string()
}

pub fn meme_stocks(quotes: &[QuoteRecord]) -> String {
    if quotes.is_empty() {
        return "Meme stock check: quotes unavailable right now.".to_string();
    }
    let mut post = String::from("Meme stock check:\n\n");
    for q in quotes.iter().take(LIST_LIMIT) {
        let _ = writeln!(post, "{}", quote_line(q));
    }
    post.trim_end().to_string()
}

pub fn overnight_drops(drops: &[Labeled<QuoteRecord>]) -> String {
    if drops.is_empty() {
        return "No major overnight drops in the sectors we track.".to_string();
    }
    let mut post = String::from("Biggest overnight drops:\n\n");
    for (i, l) in drops.iter().take(LIST_LIMIT).enumerate() {
        let change = l
            .record
            .change_pct
            .map(signed_pct)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let _ = writeln!(post, "{}. ${} {change} ({})", i + 1, l.record.ticker, l.category);
    }
    post.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Filings
// ---------------------------------------------------------------------------

pub fn earnings_filings(filings: &[FilingRecord]) -> String {
    if filings.is_empty() {
        return "No recent earnings filings on EDGAR for today's reporters.".to_string();
    }
    let mut post = String::from("Latest earnings filings on EDGAR:\n\n");
    for f in filings.iter().take(LIST_LIMIT) {
        let _ = writeln!(post, "${} {} ({}): {}", f.ticker, f.form, na(&f.filed), f.url);
    }
    post.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn na(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

fn signed_pct(pct: f64) -> String {
    format!("{pct:+.2}%")
}

fn quote_line(q: &QuoteRecord) -> String {
    let change = q
        .change_pct
        .map(signed_pct)
        .unwrap_or_else(|| na(&q.change).to_string());
    format!("${} {} ({change})", q.ticker, na(&q.price))
}
