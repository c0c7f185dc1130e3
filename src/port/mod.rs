//! Interfaces the publisher depends on. Adapters live in [`crate::adapter`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Review, Window};
use crate::error::{FetchError, StoreError};

/// Source of reviews for a time window.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Returns the reviews published inside `window`, in feed order.
    async fn fetch_items(&self, window: Window) -> Result<Vec<Review>, FetchError>;
}

/// One entry found at the artifact location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub name: String,
    pub modified: Option<DateTime<Utc>>,
}

/// Flat namespace of named artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    fn location(&self) -> &Path;

    /// Creates the location if it does not exist yet.
    async fn ensure_location(&self) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<StoredEntry>, StoreError>;

    /// Writes `bytes` under `name`, replacing any previous content, and
    /// returns the resulting locator.
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError>;

    /// Deletes `name`. A missing entry is not an error.
    async fn remove(&self, name: &str) -> Result<(), StoreError>;
}
