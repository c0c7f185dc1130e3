//! Shared test doubles for the clock, fetcher and artifact store ports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::Clock;
use crate::domain::{Review, Window};
use crate::error::{FetchError, StoreError};
use crate::port::{ArtifactStore, ItemFetcher, StoredEntry};

/// Clock pinned to an instant until moved by hand.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wall clock driven by tokio's timer, so a paused runtime moves it forward
/// exactly as far as the scheduler sleeps.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    base: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl VirtualClock {
    /// Must be created inside a tokio runtime.
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + TimeDelta::from_std(self.origin.elapsed()).unwrap_or_default()
    }
}

/// Fetcher returning a fixed set of reviews filtered by the requested window.
pub struct StubFetcher {
    reviews: Vec<Review>,
    windows: Mutex<Vec<Window>>,
    calls: AtomicUsize,
    should_fail: AtomicBool,
}

impl StubFetcher {
    pub fn new(reviews: Vec<Review>) -> Self {
        Self {
            reviews,
            windows: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_windows(&self) -> Vec<Window> {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for StubFetcher {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ItemFetcher for StubFetcher {
    async fn fetch_items(&self, window: Window) -> Result<Vec<Review>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(window);

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }

        Ok(self
            .reviews
            .iter()
            .filter(|review| {
                DateTime::parse_from_rfc3339(&review.date)
                    .is_ok_and(|date| window.contains(date.with_timezone(&Utc)))
            })
            .cloned()
            .collect())
    }
}

/// In-memory artifact store keyed by entry name.
pub struct MemoryArtifactStore {
    location: PathBuf,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: AtomicUsize,
    should_fail: AtomicBool,
    fail_once_suffix: Mutex<Option<String>>,
}

impl MemoryArtifactStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            files: Mutex::new(BTreeMap::new()),
            writes: AtomicUsize::new(0),
            should_fail: AtomicBool::new(false),
            fail_once_suffix: Mutex::new(None),
        }
    }

    /// Makes the next write to a name ending in `suffix` fail.
    pub fn fail_next_write_to(&self, suffix: &str) {
        *self
            .fail_once_suffix
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(suffix.to_string());
    }

    /// Seeds an entry without counting it as a write.
    pub fn insert(&self, name: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), bytes.to_vec());
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    fn location(&self) -> &Path {
        &self.location
    }

    async fn ensure_location(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredEntry>, StoreError> {
        Ok(self
            .names()
            .into_iter()
            .map(|name| StoredEntry {
                name,
                modified: None,
            })
            .collect())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.location.join(name);
        let fail_once = {
            let mut suffix = self
                .fail_once_suffix
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            suffix
                .take_if(|pending| name.ends_with(pending.as_str()))
                .is_some()
        };
        if fail_once || self.should_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                path,
                source: std::io::Error::other("simulated write failure"),
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(name, bytes);
        Ok(path)
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        Ok(())
    }
}
