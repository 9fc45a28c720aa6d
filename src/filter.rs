//! Category tables and numeric thresholds.
//!
//! A `CategoryTable` maps category names ("Meme Stocks", "Crypto Mining")
//! to the tickers watched under them. Jobs scrape the union of the tickers
//! they need, then re-attach category labels and apply a `Threshold`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    pub categories: Vec<Category>,
}

impl CategoryTable {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// De-duplicated union of the tickers in `names`, in table order.
    /// Unknown category names are ignored.
    pub fn tickers_for<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        self.categories
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name))
            .flat_map(|c| c.tickers.iter())
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }

    /// Group `records` by the categories in `names` that list them.
    ///
    /// A ticker listed under several categories appears once per category;
    /// `merge_by_ticker` collapses them again.
    pub fn group<T: Clone, S: AsRef<str>>(
        &self,
        names: &[S],
        records: &[T],
        ticker_of: impl Fn(&T) -> &str,
    ) -> Vec<(String, Vec<T>)> {
        self.categories
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name))
            .map(|c| {
                let members = records
                    .iter()
                    .filter(|r| c.tickers.iter().any(|t| t == ticker_of(r)))
                    .cloned()
                    .collect();
                (c.name.clone(), members)
            })
            .collect()
    }
}

/// A record tagged with the category it was reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct Labeled<T> {
    pub category: String,
    pub record: T,
}

/// Collapse per-category results into one entry per ticker.
///
/// Later categories overwrite earlier ones (value and label). The output is
/// sorted by ticker.
pub fn merge_by_ticker<T>(
    per_category: Vec<(String, Vec<T>)>,
    ticker_of: impl Fn(&T) -> &str,
) -> Vec<Labeled<T>> {
    let mut merged: BTreeMap<String, Labeled<T>> = BTreeMap::new();
    for (category, records) in per_category {
        for record in records {
            let ticker = ticker_of(&record).to_string();
            merged.insert(ticker, Labeled { category: category.clone(), record });
        }
    }
    merged.into_values().collect()
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// A numeric gate on a percent change or dollar amount.
///
/// Every variant keeps its literal boundary: `AtMost(-3.0)` passes -3.0,
/// `Below(-3.0)` does not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Above(f64),
    AtLeast(f64),
    Below(f64),
    AtMost(f64),
    /// Absolute value at or above the bound, either direction.
    MagnitudeAtLeast(f64),
}

impl Threshold {
    /// `None` (an unparsable value) never passes.
    pub fn passes(&self, value: Option<f64>) -> bool {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return false;
        };
        match *self {
            Threshold::Above(b) => v > b,
            Threshold::AtLeast(b) => v >= b,
            Threshold::Below(b) => v < b,
            Threshold::AtMost(b) => v <= b,
            Threshold::MagnitudeAtLeast(b) => v.abs() >= b,
        }
    }
}

/// Keep the records whose value passes `threshold`.
pub fn apply<T>(
    threshold: Threshold,
    records: Vec<T>,
    value_of: impl Fn(&T) -> Option<f64>,
) -> Vec<T> {
    records
        .into_iter()
        .filter(|r| threshold.passes(value_of(r)))
        .collect()
}
