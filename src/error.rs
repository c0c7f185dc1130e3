use std::path::PathBuf;

use thiserror::Error;

/// How the recurring path should react to a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Skip this cycle and re-arm (network blips, disk hiccups).
    Transient,
    /// Stop the scheduler.
    Fatal,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("feed request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("feed responded with status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("failed to decode feed: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create artifact directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list artifacts in {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write artifact {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove artifact {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("fetching reviews failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("artifact storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("rendering digest failed: {0}")]
    Render(#[from] serde_json::Error),
}

impl PublishError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(_) | Self::Store(_) => ErrorKind::Transient,
            Self::Render(_) => ErrorKind::Fatal,
        }
    }
}
