//! CoinGecko spot price provider.
//!
//! API: `https://api.coingecko.com/api/v3/simple/price`
//! Auth: none on the public tier. Rate limit: ~30 req/min.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::CryptoFeed;
use crate::types::{BotError, CryptoRecord};

const COIN_ID: &str = "bitcoin";

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("TICKERTAPE/0.1.0 (market-bot)")
            .build()
            .context("Failed to build HTTP client for CoinGecko")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CryptoFeed for CoinGeckoClient {
    async fn bitcoin(&self) -> Result<CryptoRecord> {
        let url = format!(
            "{}/api/v3/simple/price?ids={COIN_ID}&vs_currencies=usd&include_24hr_change=true",
            self.base_url
        );
        debug!(url = %url, "Fetching BTC price");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::fetch("coingecko", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(BotError::fetch("coingecko", format!("HTTP {status}")).into());
        }

        let mut prices: HashMap<String, SimplePrice> = resp
            .json()
            .await
            .context("Failed to parse CoinGecko simple/price response")?;

        let quote = prices
            .remove(COIN_ID)
            .ok_or_else(|| BotError::fetch("coingecko", "bitcoin missing from response"))?;
        let (Some(price), Some(change)) = (quote.usd, quote.usd_24h_change) else {
            return Err(BotError::Format {
                field: "bitcoin quote".into(),
                value: format!("{quote:?}"),
            }
            .into());
        };

        info!(price, change_24h_pct = format!("{change:.2}"), "BTC quote");
        Ok(CryptoRecord {
            ticker: "BTC".into(),
            price,
            change_24h_pct: change,
        })
    }
}
