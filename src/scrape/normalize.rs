//! Cell normalisation shared by every scraper.
//!
//! Market-cap magnitudes, signed percentages, ticker cleanup and
//! currency stripping. Everything here is best effort: unparsable input
//! maps to 0, `None` or "N/A", never to an error.

use crate::types::NOT_AVAILABLE;

/// Strings the sites use for "no value".
const PLACEHOLDERS: &[&str] = &["", "—", "–", "-", "N/A", "n/a", "NA"];

/// Unicode minus sign used by TradingView for negative numbers.
const UNICODE_MINUS: char = '\u{2212}';

fn is_placeholder(s: &str) -> bool {
    PLACEHOLDERS.contains(&s)
}

/// Remove whitespace (including NBSP / narrow NBSP) and thousands separators.
fn compact(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| if c == UNICODE_MINUS { '-' } else { c })
        .collect()
}

/// Parse a market-cap string ("1.5B", "750 M USD", "2,300") into USD.
///
/// Returns 0 for placeholders, unparsable, negative or non-finite input.
pub fn parse_market_cap(raw: &str) -> f64 {
    let compacted = compact(raw);
    let cleaned = compacted
        .trim_start_matches("USD")
        .trim_end_matches("USD")
        .trim_start_matches('$');

    if is_placeholder(cleaned) {
        return 0.0;
    }

    let (number, multiplier) = match cleaned.chars().last() {
        Some('K') | Some('k') => (&cleaned[..cleaned.len() - 1], 1e3),
        Some('M') | Some('m') => (&cleaned[..cleaned.len() - 1], 1e6),
        Some('B') | Some('b') => (&cleaned[..cleaned.len() - 1], 1e9),
        Some('T') | Some('t') => (&cleaned[..cleaned.len() - 1], 1e12),
        _ => (cleaned, 1.0),
    };

    number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v * multiplier)
        .unwrap_or(0.0)
}

/// Parse a signed percentage ("+12.34%", "−3.1 %", "-0.5").
/// The sign is preserved; `None` when the text is not a number.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let compacted = compact(raw);
    let cleaned = compacted.trim_end_matches('%');
    let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned);
    if is_placeholder(cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Percent change from a quote string such as `+$1.23 (+2.45%)`.
/// Falls back to reading the whole string as a percentage.
pub fn parse_change_pct(raw: &str) -> Option<f64> {
    if let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) {
        if open < close {
            return parse_percent(&raw[open + 1..close]);
        }
    }
    parse_percent(raw)
}

/// Extract a ticker symbol from a ticker cell.
///
/// Takes the first non-empty line (cells often read "AAPL\nApple Inc."),
/// drops trailing artifact glyphs ("AAPL●" → "AAPL") and validates the
/// result: uppercase ASCII alphanumerics with at most one inner `.`.
pub fn clean_ticker(raw: &str) -> Option<String> {
    let first = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let ticker = first
        .trim_start_matches('$')
        .trim_end_matches(|c: char| !c.is_ascii_alphanumeric());

    if is_valid_ticker(ticker) {
        Some(ticker.to_string())
    } else {
        None
    }
}

fn is_valid_ticker(t: &str) -> bool {
    !t.is_empty()
        && t.len() <= 10
        && t.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.')
        && !t.starts_with('.')
        && !t.ends_with('.')
        && t.matches('.').count() <= 1
}

/// Drop a "USD" annotation and all whitespace from a numeric-looking cell.
pub fn strip_currency(raw: &str) -> String {
    let compacted = compact(raw);
    compacted
        .trim_start_matches("USD")
        .trim_end_matches("USD")
        .to_string()
}

/// Replace an empty or dash placeholder with the literal "N/A".
pub fn or_na(value: String) -> String {
    if is_placeholder(value.trim()) {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

/// `strip_currency` followed by `or_na`.
pub fn clean_value(raw: &str) -> String {
    or_na(strip_currency(raw))
}
