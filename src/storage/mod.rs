//! Persistence layer.
//!
//! The only state that outlives a run is the ID of the last post seen on
//! the watched account. It is kept as plain text in a single file so it
//! can be inspected or reset by hand.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default checkpoint file path.
pub const DEFAULT_CHECKPOINT_FILE: &str = "last_seen_post.txt";

/// Last-seen post ID store.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored ID, `None` if the file is missing or blank.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No checkpoint found, starting fresh");
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read checkpoint {}", self.path.display()))?;
        let id = raw.trim();
        Ok((!id.is_empty()).then(|| id.to_string()))
    }

    pub fn save(&self, id: &str) -> Result<()> {
        std::fs::write(&self.path, id)
            .with_context(|| format!("Failed to write checkpoint {}", self.path.display()))?;
        debug!(path = %self.path.display(), id, "Checkpoint saved");
        Ok(())
    }

    /// Record `latest` if it differs from the stored ID.
    ///
    /// Returns `true` when the ID changed (a missing file counts as a
    /// change), `false` when `latest` was already stored.
    pub fn advance(&self, latest: &str) -> Result<bool> {
        if self.load()?.as_deref() == Some(latest) {
            return Ok(false);
        }
        self.save(latest)?;
        Ok(true)
    }

    /// Delete the checkpoint file (for testing or reset).
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete checkpoint {}", self.path.display()))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
