//! Twitter API v2 client.
//!
//! Base URL: https://api.twitter.com
//! Posting: `POST /2/tweets`, OAuth 1.0a user context.
//! Reading: `GET /2/users/by/username/{u}` and `GET /2/users/{id}/tweets`,
//! app-only bearer token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::oauth::{self, OAuthCredentials};
use super::{DryRunPublisher, PostReceipt, Publisher, TimelineReader};
use crate::config::{AppConfig, TwitterConfig};
use crate::types::BotError;

/// Posts fetched when looking for the latest one (API minimum is 5).
const TIMELINE_PAGE: u32 = 5;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TimelinePost {
    id: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct TwitterClient {
    http: Client,
    base_url: String,
    oauth: OAuthCredentials,
    bearer: Option<SecretString>,
}

impl TwitterClient {
    /// `bearer` is only needed for timeline reads; posting uses `oauth`.
    pub fn new(
        base_url: &str,
        oauth: OAuthCredentials,
        bearer: Option<SecretString>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("TICKERTAPE/0.1.0 (market-bot)")
            .build()
            .context("Failed to build HTTP client for Twitter")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            oauth,
            bearer,
        })
    }

    /// Build a client from the env vars named in `cfg`.
    /// Fails if any of the four OAuth credentials is missing. A missing
    /// bearer token only disables timeline reads.
    pub fn from_env(cfg: &TwitterConfig) -> Result<Self> {
        let oauth = OAuthCredentials {
            consumer_key: AppConfig::resolve_env(&cfg.api_key_env)?,
            consumer_secret: SecretString::new(AppConfig::resolve_env(&cfg.api_secret_env)?),
            token: AppConfig::resolve_env(&cfg.access_token_env)?,
            token_secret: SecretString::new(AppConfig::resolve_env(&cfg.access_token_secret_env)?),
        };
        let bearer = AppConfig::resolve_env(&cfg.bearer_token_env).ok().map(SecretString::new);
        Self::new(&cfg.base_url, oauth, bearer)
    }

    /// Whether a bearer token is configured for timeline reads.
    pub fn can_read_timeline(&self) -> bool {
        self.bearer.is_some()
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<Envelope<T>> {
        let bearer = self
            .bearer
            .as_ref()
            .ok_or_else(|| BotError::Config("no Twitter bearer token for timeline reads".into()))?;

        debug!(url, "Twitter GET");
        let resp = self
            .http
            .get(url)
            .bearer_auth(bearer.expose_secret())
            .send()
            .await
            .map_err(|e| BotError::fetch(url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::fetch(url, format!("HTTP {status}: {body}")).into());
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse Twitter response from {url}"))
    }
}

#[async_trait]
impl Publisher for TwitterClient {
    async fn publish(&self, text: &str) -> Result<PostReceipt> {
        let url = format!("{}/2/tweets", self.base_url);
        let auth = oauth::authorization_header(
            &self.oauth,
            "POST",
            &url,
            &[],
            &oauth::nonce(),
            chrono::Utc::now().timestamp(),
        )?;

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| BotError::Publish(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::Publish(format!("HTTP {status}: {body}")).into());
        }

        let created: Envelope<CreatedPost> = resp
            .json()
            .await
            .context("Failed to parse create-post response")?;
        let post = created
            .data
            .ok_or_else(|| BotError::Publish("response carried no post".into()))?;

        info!(post_id = %post.id, "Post published");
        Ok(PostReceipt { id: post.id, text: post.text })
    }
}

#[async_trait]
impl TimelineReader for TwitterClient {
    async fn user_id(&self, username: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/2/users/by/username/{}",
            self.base_url,
            urlencoding::encode(username)
        );
        let user: Envelope<User> = self.get_json(&url).await?;
        Ok(user.data.map(|u| u.id))
    }

    async fn latest_post_id(&self, user_id: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/2/users/{}/tweets?max_results={TIMELINE_PAGE}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let posts: Envelope<Vec<TimelinePost>> = self.get_json(&url).await?;
        Ok(posts.data.and_then(|p| p.into_iter().next()).map(|p| p.id))
    }
}

/// Publisher and optional timeline reader for `cfg`.
///
/// Posting needs the four OAuth secrets and falls back to dry-run without
/// them. The timeline reader additionally needs the bearer token.
pub fn connect(cfg: &TwitterConfig) -> (Arc<dyn Publisher>, Option<Arc<dyn TimelineReader>>) {
    let client = match TwitterClient::from_env(cfg) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "Twitter OAuth credentials incomplete, running in dry-run mode");
            return (Arc::new(DryRunPublisher), None);
        }
    };

    let timeline: Option<Arc<dyn TimelineReader>> = if client.can_read_timeline() {
        Some(client.clone() as Arc<dyn TimelineReader>)
    } else {
        warn!(env = %cfg.bearer_token_env, "No bearer token, timeline-triggered jobs will stay quiet");
        None
    };

    let publisher: Arc<dyn Publisher> = if cfg.dry_run {
        info!("Dry-run enabled, posts will only be logged");
        Arc::new(DryRunPublisher)
    } else {
        client as Arc<dyn Publisher>
    };
    (publisher, timeline)
}
