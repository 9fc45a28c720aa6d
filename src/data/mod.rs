//! HTTP data sources that need no browser.
//!
//! Defines the `CryptoFeed` and `FilingLookup` traits and provides
//! implementations for CoinGecko (spot crypto) and SEC EDGAR (filings).

pub mod coingecko;
pub mod edgar;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{CryptoRecord, FilingRecord};

/// Spot price and 24h change of a cryptocurrency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CryptoFeed: Send + Sync {
    /// Current BTC/USD quote.
    async fn bitcoin(&self) -> Result<CryptoRecord>;
}

/// Latest earnings-related filing of a listed company.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FilingLookup: Send + Sync {
    /// Most recent 10-Q or 8-K for `ticker`; `None` when the ticker is
    /// unknown or has no such filing.
    async fn latest_earnings_filing(&self, ticker: &str) -> Result<Option<FilingRecord>>;
}
