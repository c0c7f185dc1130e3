//! Index of previously written artifacts, rebuilt from the store on every
//! query. Calls are bounded by the publish interval, so a full rescan is fine.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::StoreError;
use crate::port::{ArtifactStore, StoredEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactIndex {
    records: Vec<ArtifactRecord>,
}

impl ArtifactIndex {
    pub async fn scan(store: &dyn ArtifactStore) -> Result<Self, StoreError> {
        let entries = store.list().await?;
        Ok(Self::from_entries(store.location(), entries))
    }

    /// Builds the index from raw entries. Names that do not parse as a Unix
    /// timestamp are logged and skipped.
    pub fn from_entries(location: &Path, entries: impl IntoIterator<Item = StoredEntry>) -> Self {
        let mut named: Vec<(String, DateTime<Utc>)> = entries
            .into_iter()
            .filter_map(|entry| match parse_artifact_timestamp(&entry.name) {
                Some(timestamp) => Some((entry.name, timestamp)),
                None => {
                    warn!(
                        file_name = %entry.name,
                        location = %location.display(),
                        "skipping artifact without a timestamp name"
                    );
                    None
                }
            })
            .collect();

        // Newest first; the .json/.md pair of one digest shares a timestamp
        // and the lexicographically smaller name wins.
        named.sort_by(|(a_name, a_ts), (b_name, b_ts)| match b_ts.cmp(a_ts) {
            Ordering::Equal => a_name.cmp(b_name),
            other => other,
        });

        let records = named
            .into_iter()
            .map(|(name, timestamp)| ArtifactRecord {
                timestamp,
                path: location.join(name),
            })
            .collect();

        Self { records }
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ArtifactRecord> {
        self.records.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.records.iter()
    }
}

/// Strips the final extension and parses the rest as base-10 Unix seconds.
#[must_use]
pub fn parse_artifact_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let secs = stem.parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tracing_test::traced_test;

    fn entry(name: &str) -> StoredEntry {
        StoredEntry {
            name: name.to_string(),
            modified: None,
        }
    }

    #[rstest]
    #[case("1700000000.json", Some(1_700_000_000))]
    #[case("1700003600.md", Some(1_700_003_600))]
    #[case("1700003600", Some(1_700_003_600))]
    #[case("abc.json", None)]
    #[case(".DS_Store", None)]
    #[case("1700000000.json.bak", None)]
    #[case("", None)]
    fn parses_timestamp_names(#[case] name: &str, #[case] expected: Option<i64>) {
        let parsed = parse_artifact_timestamp(name).map(|t| t.timestamp());
        assert_eq!(parsed, expected);
    }

    #[traced_test]
    #[test]
    fn scan_skips_unparseable_entries() {
        let index = ArtifactIndex::from_entries(
            Path::new("out"),
            vec![
                entry("1700000000.json"),
                entry("abc.json"),
                entry("1700003600.md"),
            ],
        );

        let latest = index.latest().unwrap();
        assert_eq!(latest.timestamp.timestamp(), 1_700_003_600);
        assert_eq!(latest.path, Path::new("out").join("1700003600.md"));
        assert_eq!(index.len(), 2);
        assert!(logs_contain("skipping artifact without a timestamp name"));
        assert!(logs_contain("abc.json"));
    }

    #[test]
    fn empty_index_has_no_latest() {
        let index = ArtifactIndex::from_entries(Path::new("out"), Vec::new());
        assert!(index.is_empty());
        assert!(index.latest().is_none());
    }

    #[test]
    fn json_wins_over_markdown_for_the_same_digest() {
        let index = ArtifactIndex::from_entries(
            Path::new("out"),
            vec![
                entry("1700003600.md"),
                entry("1700000000.json"),
                entry("1700003600.json"),
            ],
        );

        assert_eq!(
            index.latest().unwrap().path,
            Path::new("out").join("1700003600.json")
        );
        let order: Vec<i64> = index.iter().map(|r| r.timestamp.timestamp()).collect();
        assert_eq!(order, vec![1_700_003_600, 1_700_003_600, 1_700_000_000]);
    }
}
