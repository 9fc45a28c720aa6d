//! Posting and timeline access.
//!
//! Defines the `Publisher` and `TimelineReader` traits, the Twitter v2
//! client that implements both, and a dry-run publisher that only logs.

pub mod format;
pub mod oauth;
pub mod twitter;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Platform character ceiling for one post.
pub const MAX_POST_CHARS: usize = 280;

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReceipt {
    pub id: String,
    pub text: String,
}

impl PostReceipt {
    /// Receipt for a post that was logged instead of sent.
    pub fn dry_run(text: &str) -> Self {
        Self {
            id: format!("dry-run-{}", Uuid::new_v4()),
            text: text.to_string(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.id.starts_with("dry-run-")
    }
}

/// Something that can publish a text post.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PostReceipt>;
}

/// Read access to another account's timeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimelineReader: Send + Sync {
    /// Numeric user ID for `username`, `None` if the account does not exist.
    async fn user_id(&self, username: &str) -> Result<Option<String>>;

    /// ID of the most recent post by `user_id`, `None` if there are none.
    async fn latest_post_id(&self, user_id: &str) -> Result<Option<String>>;
}

/// Logs posts instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<PostReceipt> {
        let receipt = PostReceipt::dry_run(text);
        info!(post_id = %receipt.id, chars = text.chars().count(), "[DRY RUN] Would post:\n{text}");
        Ok(receipt)
    }
}

/// Trim `text` to `MAX_POST_CHARS`, dropping whole trailing lines where
/// possible and hard-cutting with an ellipsis otherwise.
pub fn clamp_to_limit(text: &str) -> String {
    if text.chars().count() <= MAX_POST_CHARS {
        return text.to_string();
    }
    warn!(
        chars = text.chars().count(),
        limit = MAX_POST_CHARS,
        "Post too long, trimming"
    );

    let mut out = String::new();
    let mut used = 0;
    for line in text.lines() {
        let cost = line.chars().count() + usize::from(!out.is_empty());
        if used + cost > MAX_POST_CHARS {
            break;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        used += cost;
    }

    let out = out.trim_end().to_string();
    if !out.is_empty() {
        return out;
    }
    let mut cut: String = text.chars().take(MAX_POST_CHARS - 1).collect();
    cut.push('…');
    cut
}
