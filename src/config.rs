//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (Twitter keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Weekday};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::jobs::JobKind;
use crate::filter::{Category, CategoryTable, Threshold};
use crate::types::{BotError, CalendarView, ReportTime};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub browser: BrowserConfig,
    pub twitter: TwitterConfig,
    pub endpoints: EndpointsConfig,
    pub thresholds: ThresholdsConfig,
    pub calendar: CalendarConfig,
    pub earnings: EarningsConfig,
    pub watch: WatchConfig,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub name: String,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_checkpoint_file")]
    pub checkpoint_file: String,
    /// Publish the "nothing to report" text when a job finds no data.
    #[serde(default)]
    pub post_placeholders: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Chrome/Chromium binary; auto-detected when unset.
    #[serde(default)]
    pub chrome_path: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
}

impl BrowserConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TwitterConfig {
    /// Log posts instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
    pub base_url: String,
    /// Account whose new posts trigger the meme-stock check.
    pub watch_username: String,
    pub api_key_env: String,
    pub api_secret_env: String,
    pub access_token_env: String,
    pub access_token_secret_env: String,
    pub bearer_token_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointsConfig {
    pub coingecko_base_url: String,
    pub sec_www_base_url: String,
    pub sec_data_base_url: String,
    /// SEC requires a declared contact in the User-Agent.
    pub sec_user_agent: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdsConfig {
    pub overnight_drop: Threshold,
    pub btc_move: Threshold,
    pub earnings_market_cap: Threshold,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalendarConfig {
    pub default_view: CalendarView,
    /// Weekday name → view, overriding `default_view`.
    #[serde(default)]
    pub views: HashMap<String, CalendarView>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarningsConfig {
    /// Weekday name → tickers always reported that day regardless of size.
    #[serde(default)]
    pub watchlist: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatchConfig {
    pub overnight_categories: Vec<String>,
    pub crypto_categories: Vec<String>,
    pub meme_categories: Vec<String>,
}

/// One daily slot of the dispatcher.
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleEntry {
    pub name: String,
    /// Local wall-clock time, `HH:MM`.
    pub at: String,
    pub job: JobKind,
}

impl ScheduleEntry {
    pub fn time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.at, "%H:%M").map_err(|e| {
            BotError::Config(format!("schedule '{}': bad time {:?}: {e}", self.name, self.at))
                .into()
        })
    }
}

fn default_true() -> bool {
    true
}
fn default_tick_interval() -> u64 {
    30
}
fn default_checkpoint_file() -> String {
    crate::storage::DEFAULT_CHECKPOINT_FILE.to_string()
}
fn default_page_timeout() -> u64 {
    30
}
fn default_http_timeout() -> u64 {
    15
}

/// Parse a weekday key ("sunday", "Sun").
pub fn parse_weekday(key: &str) -> Result<Weekday> {
    Weekday::from_str(key.trim())
        .map_err(|_| BotError::Config(format!("unknown weekday {key:?}")).into())
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    pub fn category_table(&self) -> CategoryTable {
        CategoryTable::new(self.categories.clone())
    }

    /// Reject schedules and tables that would only fail at run time.
    pub fn validate(&self) -> Result<()> {
        if self.bot.tick_interval_secs == 0 {
            return Err(BotError::Config("bot.tick_interval_secs must be > 0".into()).into());
        }
        for entry in &self.schedule {
            entry.time()?;
            if entry.job == (JobKind::Earnings { session: ReportTime::Unspecified }) {
                return Err(BotError::Config(format!(
                    "schedule '{}': earnings session must be before_open or after_close",
                    entry.name
                ))
                .into());
            }
        }
        for key in self.calendar.views.keys().chain(self.earnings.watchlist.keys()) {
            parse_weekday(key)?;
        }

        let known: Vec<&str> = self.categories.iter().map(|c| c.name.as_str()).collect();
        let referenced = self
            .watch
            .overnight_categories
            .iter()
            .chain(&self.watch.crypto_categories)
            .chain(&self.watch.meme_categories);
        for name in referenced {
            if !known.contains(&name.as_str()) {
                return Err(BotError::Config(format!("unknown category {name:?}")).into());
            }
        }
        Ok(())
    }
}
