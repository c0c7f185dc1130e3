//! Artifact store backed by a plain directory. Every digest is one file whose
//! name is the Unix timestamp of its window end plus an extension.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::port::{ArtifactStore, StoredEntry};

#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    directory: PathBuf,
}

impl FsArtifactStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Store for one app below `output_root`, so several apps can share a root.
    pub fn for_app(output_root: impl AsRef<Path>, app_id: &str) -> Self {
        Self::new(output_root.as_ref().join(app_id))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn location(&self) -> &Path {
        &self.directory
    }

    async fn ensure_location(&self) -> Result<(), StoreError> {
        if fs::try_exists(&self.directory).await.unwrap_or(false) {
            return Ok(());
        }
        info!(directory = %self.directory.display(), "creating artifact directory");
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: self.directory.clone(),
                source,
            })
    }

    async fn list(&self) -> Result<Vec<StoredEntry>, StoreError> {
        let list_err = |source| StoreError::List {
            path: self.directory.clone(),
            source,
        };

        let mut dir = fs::read_dir(&self.directory).await.map_err(list_err)?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await.map_err(list_err)? {
            let metadata = entry.metadata().await.map_err(list_err)?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
            entries.push(StoredEntry { name, modified });
        }

        Ok(entries)
    }

    /// Writes through a hidden temporary file and renames it into place, so a
    /// listed entry always has its full content.
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.directory.join(name);
        let staging = self.directory.join(format!(".{name}.tmp"));
        info!(path = %path.display(), bytes = bytes.len(), "writing artifact");

        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };
        fs::write(&staging, bytes).await.map_err(write_err)?;
        if let Err(source) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(write_err(source));
        }
        Ok(path)
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.directory.join(name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "removed artifact");
                Ok(())
            }
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn ensure_location_creates_missing_directory() {
        let root = TempDir::new().unwrap();
        let store = FsArtifactStore::for_app(root.path(), "595068606");

        store.ensure_location().await.unwrap();
        store.ensure_location().await.unwrap();

        assert!(root.path().join("595068606").is_dir());
    }

    #[tokio::test]
    async fn list_reports_written_files_only() {
        let root = TempDir::new().unwrap();
        let store = FsArtifactStore::new(root.path());
        std::fs::create_dir(root.path().join("1700000000")).unwrap();

        let path = store.write("1700003600.json", b"{}").await.unwrap();
        let entries = store.list().await.unwrap();

        assert_eq!(path, root.path().join("1700003600.json"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "1700003600.json");
        assert!(entries[0].modified.is_some());
    }

    #[tokio::test]
    async fn write_replaces_existing_content() {
        let root = TempDir::new().unwrap();
        let store = FsArtifactStore::new(root.path());

        store.write("1.md", b"first version").await.unwrap();
        let path = store.write("1.md", b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[tokio::test]
    async fn write_leaves_no_staging_file_behind() {
        let root = TempDir::new().unwrap();
        let store = FsArtifactStore::new(root.path());

        store.write("1700003600.json", b"{}").await.unwrap();

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["1700003600.json".to_string()]);
    }

    #[tokio::test]
    async fn remove_deletes_and_tolerates_missing_entries() {
        let root = TempDir::new().unwrap();
        let store = FsArtifactStore::new(root.path());
        let path = store.write("1700003600.md", b"#").await.unwrap();

        store.remove("1700003600.md").await.unwrap();
        store.remove("1700003600.md").await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn list_fails_when_location_is_missing() {
        let root = TempDir::new().unwrap();
        let store = FsArtifactStore::new(root.path().join("absent"));

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, StoreError::List { .. }));
    }
}
