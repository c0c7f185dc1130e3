//! Idempotent digest publication.
//!
//! [`Publisher::publish_latest`] hands back the newest artifact while it still
//! covers the current interval, and otherwise fetches, renders and persists a
//! fresh digest named after its window end.

pub mod gate;
pub mod index;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};

use crate::config::ConfigSource;
use crate::domain::Digest;
use crate::error::{ErrorKind, PublishError};
use crate::port::{ArtifactStore, ItemFetcher};
use crate::scheduler::{JobError, ScheduledJob};

pub use gate::{Decision, PublicationGate};
pub use index::{ArtifactIndex, ArtifactRecord, parse_artifact_timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A digest from the current interval already existed.
    Reused(ArtifactRecord),
    /// A new digest was written.
    Produced {
        record: ArtifactRecord,
        reviews: usize,
    },
}

impl PublishOutcome {
    /// Path of the JSON digest.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.record().path
    }

    #[must_use]
    pub fn record(&self) -> &ArtifactRecord {
        match self {
            Self::Reused(record) | Self::Produced { record, .. } => record,
        }
    }
}

pub struct Publisher {
    fetcher: Arc<dyn ItemFetcher>,
    store: Arc<dyn ArtifactStore>,
    gate: PublicationGate,
}

impl Publisher {
    pub fn new(
        fetcher: Arc<dyn ItemFetcher>,
        store: Arc<dyn ArtifactStore>,
        gate: PublicationGate,
    ) -> Self {
        Self {
            fetcher,
            store,
            gate,
        }
    }

    pub fn from_config(
        config: &impl ConfigSource,
        fetcher: Arc<dyn ItemFetcher>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self::new(
            fetcher,
            store,
            PublicationGate::new(config.publish_interval()),
        )
    }

    #[must_use]
    pub fn location(&self) -> &Path {
        self.store.location()
    }

    /// Makes sure the artifact location exists before the first decision.
    pub async fn prepare(&self) -> Result<(), PublishError> {
        self.store.ensure_location().await?;
        Ok(())
    }

    pub async fn publish_latest(&self, now: DateTime<Utc>) -> Result<PublishOutcome, PublishError> {
        let index = ArtifactIndex::scan(self.store.as_ref()).await?;
        let decision = self.gate.decide(now, &index);
        debug!(
            artifacts = index.len(),
            window_start = %decision.window.start.to_rfc3339(),
            window_end = %decision.window.end.to_rfc3339(),
            reuse = decision.reuse(),
            "publication decision"
        );

        if let Some(existing) = decision.existing {
            info!(path = %existing.path.display(), "reusing latest digest");
            return Ok(PublishOutcome::Reused(existing));
        }

        let window = decision.window;
        let reviews = self.fetcher.fetch_items(window).await?;
        let count = reviews.len();

        let digest = Digest::new(
            reviews,
            &window.start.with_timezone(&Local),
            &window.end.with_timezone(&Local),
        );
        let json = serde_json::to_vec_pretty(&digest)?;
        let markdown = digest.to_markdown();

        // JSON goes last. If it fails, the markdown is removed so the next
        // run produces the pair again.
        let stamp = window.end.timestamp();
        let markdown_name = format!("{stamp}.md");
        let markdown_path = self
            .store
            .write(&markdown_name, markdown.as_bytes())
            .await?;
        let json_path = match self.store.write(&format!("{stamp}.json"), &json).await {
            Ok(path) => path,
            Err(err) => {
                if let Err(cleanup) = self.store.remove(&markdown_name).await {
                    warn!(
                        path = %markdown_path.display(),
                        error = %cleanup,
                        "failed to remove incomplete digest"
                    );
                }
                return Err(err.into());
            }
        };

        info!(
            json = %json_path.display(),
            markdown = %markdown_path.display(),
            reviews = count,
            "published new digest"
        );

        Ok(PublishOutcome::Produced {
            record: ArtifactRecord {
                timestamp: DateTime::from_timestamp(stamp, 0).unwrap_or(window.end),
                path: json_path,
            },
            reviews: count,
        })
    }
}

/// Runs [`Publisher::publish_latest`] at every scheduler fire.
pub struct PublishJob {
    publisher: Arc<Publisher>,
}

impl PublishJob {
    pub fn new(publisher: Arc<Publisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl ScheduledJob for PublishJob {
    async fn run(&self, fired_at: DateTime<Utc>) -> Result<(), JobError> {
        match self.publisher.publish_latest(fired_at).await {
            Ok(outcome) => {
                info!(path = %outcome.path().display(), "latest digest ready");
                Ok(())
            }
            Err(err) => match err.kind() {
                ErrorKind::Transient => Err(JobError::Transient(err.into())),
                ErrorKind::Fatal => Err(JobError::Fatal(err.into())),
            },
        }
    }
}
