//! JSON-file-backed persistent cache tier.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::domain::RouteResult;

use super::clock::Clock;
use super::error::CacheError;
use super::key::CacheKey;
use super::store::{CacheEntry, CacheStore};

type Entries = HashMap<CacheKey, CacheEntry>;

/// Cache tier that survives restarts by keeping every entry in one JSON file.
///
/// The file is opened lazily on first use. If that fails (unwritable
/// directory, path occupied by something else) the store reports itself
/// unavailable and tries again on the next call.
///
/// The in-memory map is authoritative. Every change is applied to it first
/// and then written out, so when a write fails the change still holds for
/// this process and reaches disk with the next successful write.
pub struct FileStore {
    path: PathBuf,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: OnceCell<Mutex<Entries>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            default_ttl,
            clock,
            entries: OnceCell::new(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn entries(&self) -> Result<&Mutex<Entries>, CacheError> {
        self.entries
            .get_or_try_init(|| async { self.open().await.map(Mutex::new) })
            .await
    }

    async fn open(&self) -> Result<Entries, CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CacheError::Unavailable(format!(
                    "cannot create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => {
                return Err(CacheError::Unavailable(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let mut entries: Entries = match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable route cache file");
                Entries::new()
            }
        };

        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        debug!(
            path = %self.path.display(),
            loaded = entries.len(),
            pruned = before - entries.len(),
            "opened route cache file"
        );

        Ok(entries)
    }

    /// Write the whole map to a sibling temp file, then rename it into place.
    async fn persist(&self, entries: &Entries) -> Result<(), CacheError> {
        let json = serde_json::to_vec(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let mut entries = self.entries().await?.lock().await;
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };

        if entry.is_expired(self.clock.now()) {
            debug!(%key, "evicting expired file entry");
            entries.remove(key);
            self.persist(&entries).await?;
            return Ok(None);
        }

        Ok(Some(entry.clone()))
    }

    async fn insert(
        &self,
        key: CacheKey,
        result: RouteResult,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(key.clone(), result, self.clock.now(), ttl);

        let mut entries = self.entries().await?.lock().await;
        entries.insert(key, entry);
        self.persist(&entries).await
    }

    async fn remove_all(&self) -> Result<(), CacheError> {
        let mut entries = self.entries().await?.lock().await;
        entries.clear();
        self.persist(&entries).await
    }

    async fn sweep(&self) -> usize {
        let Ok(entries) = self.entries().await else {
            return 0;
        };
        let mut entries = entries.lock().await;

        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        if removed > 0
            && let Err(e) = self.persist(&entries).await
        {
            warn!(path = %self.path.display(), error = %e, "failed to persist route cache sweep");
        }

        removed
    }
}

impl CacheStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn is_available(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            match self.entries().await {
                Ok(_) => true,
                Err(e) => {
                    debug!(error = %e, "file cache unavailable");
                    false
                }
            }
        })
    }

    fn get<'a>(
        &'a self,
        key: &'a CacheKey,
    ) -> BoxFuture<'a, Result<Option<CacheEntry>, CacheError>> {
        Box::pin(self.lookup(key))
    }

    fn set(
        &self,
        key: CacheKey,
        result: RouteResult,
        ttl: Option<Duration>,
    ) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(self.insert(key, result, ttl))
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(self.remove_all())
    }

    fn cleanup(&self) -> BoxFuture<'_, usize> {
        Box::pin(self.sweep())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::domain::{Coordinate, RouteSource};
    use tempfile::tempdir;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn key() -> CacheKey {
        CacheKey::new(
            Coordinate::new(48.7758, 9.1829),
            Coordinate::new(49.0069, 8.4037),
            4,
        )
    }

    fn other_key(lat: f64) -> CacheKey {
        CacheKey::new(
            Coordinate::new(lat, 9.1829),
            Coordinate::new(49.0069, 8.4037),
            4,
        )
    }

    fn result() -> RouteResult {
        RouteResult::new(
            Coordinate::new(48.7758, 9.1829),
            Coordinate::new(49.0069, 8.4037),
            80_000.0,
            3_600.0,
            vec![
                Coordinate::new(48.7758, 9.1829),
                Coordinate::new(48.9, 8.8),
                Coordinate::new(49.0069, 8.4037),
            ],
            RouteSource::Valhalla,
            0.8,
        )
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let clock = Arc::new(ManualClock::default());

        let store = FileStore::new(&path, HOUR, clock.clone());
        store.set(key(), result(), None).await.unwrap();
        drop(store);

        let reopened = FileStore::new(&path, HOUR, clock);
        let entry = reopened.get(&key()).await.unwrap().unwrap();
        assert_eq!(entry.result, result());
        assert_eq!(entry.ttl, HOUR);
    }

    #[tokio::test]
    async fn missing_file_is_empty_and_available() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("routes.json");
        let store = FileStore::new(&path, HOUR, Arc::new(ManualClock::default()));

        assert!(store.is_available().await);
        assert!(store.get(&key()).await.unwrap().is_none());

        store.set(key(), result(), None).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let store = FileStore::new(dir.path().join("routes.json"), HOUR, clock.clone());

        store
            .set(key(), result(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(11));

        assert!(store.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entries_pruned_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let clock = Arc::new(ManualClock::default());

        let store = FileStore::new(&path, HOUR, clock.clone());
        store
            .set(key(), result(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        drop(store);

        clock.advance(Duration::from_secs(60));
        let reopened = FileStore::new(&path, HOUR, clock);
        assert!(reopened.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_removes_expired() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let store = FileStore::new(dir.path().join("routes.json"), HOUR, clock.clone());

        store
            .set(key(), result(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(store.cleanup().await, 0);

        clock.advance(Duration::from_secs(11));
        assert_eq!(store.cleanup().await, 1);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let clock = Arc::new(ManualClock::default());

        let store = FileStore::new(&path, HOUR, clock.clone());
        store.set(key(), result(), None).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.get(&key()).await.unwrap().is_none());

        let reopened = FileStore::new(&path, HOUR, clock);
        assert!(reopened.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path, HOUR, Arc::new(ManualClock::default()));
        assert!(store.is_available().await);
        assert!(store.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blocked_path_is_unavailable() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let store = FileStore::new(
            blocker.join("routes.json"),
            HOUR,
            Arc::new(ManualClock::default()),
        );

        assert!(!store.is_available().await);
        assert!(matches!(
            store.get(&key()).await,
            Err(CacheError::Unavailable(_))
        ));
        assert!(store.set(key(), result(), None).await.is_err());
        assert_eq!(store.cleanup().await, 0);
    }

    #[tokio::test]
    async fn failed_write_keeps_entry_until_next_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let clock = Arc::new(ManualClock::default());
        let store = FileStore::new(&path, HOUR, clock.clone());
        store.set(key(), result(), None).await.unwrap();

        // Occupy the temp file's path so the next write fails.
        let tmp = path.with_extension("tmp");
        std::fs::create_dir(&tmp).unwrap();
        assert!(store.set(other_key(48.0), result(), None).await.is_err());
        assert!(store.get(&other_key(48.0)).await.unwrap().is_some());

        let on_disk = FileStore::new(&path, HOUR, clock.clone());
        assert!(on_disk.get(&other_key(48.0)).await.unwrap().is_none());
        drop(on_disk);

        std::fs::remove_dir(&tmp).unwrap();
        store.set(other_key(47.0), result(), None).await.unwrap();

        let reopened = FileStore::new(&path, HOUR, clock);
        for k in [key(), other_key(48.0), other_key(47.0)] {
            assert!(reopened.get(&k).await.unwrap().is_some(), "{k}");
        }
    }
}
