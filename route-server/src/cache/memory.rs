//! Bounded in-process cache tier.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use moka::Expiry;
use moka::future::Cache as MokaCache;
use moka::policy::EvictionPolicy;
use tracing::debug;

use crate::domain::RouteResult;

use super::clock::Clock;
use super::error::CacheError;
use super::key::CacheKey;
use super::store::{CacheEntry, CacheStore};

/// Gives each moka entry its own TTL as a backstop to the clock-driven
/// expiry checks.
struct EntryExpiry;

impl Expiry<CacheKey, Arc<CacheEntry>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process LRU tier.
///
/// Expiry is judged against the injected [`Clock`]: a read of an expired
/// entry removes it, and [`MemoryStore::cleanup`] sweeps the rest. When the
/// store is full the least recently used entry is evicted.
pub struct MemoryStore {
    entries: MokaCache<CacheKey, Arc<CacheEntry>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create a store holding at most `capacity` entries.
    pub fn new(capacity: u64, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(EntryExpiry)
            .build();

        Self {
            entries,
            default_ttl,
            clock,
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.get(key).await?;
        if entry.is_expired(self.clock.now()) {
            debug!(%key, "evicting expired memory entry");
            self.entries.invalidate(key).await;
            return None;
        }
        Some(entry.as_ref().clone())
    }

    async fn insert(&self, key: CacheKey, result: RouteResult, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(key.clone(), result, self.clock.now(), ttl);
        self.entries.insert(key, Arc::new(entry)).await;
    }

    /// Remove every expired entry, returning the number removed.
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<Arc<CacheKey>> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key)
            .collect();

        for key in &expired {
            self.entries.invalidate(key.as_ref()).await;
        }

        expired.len()
    }

    /// Number of live entries, after applying pending evictions.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl CacheStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn is_available(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }

    fn get<'a>(
        &'a self,
        key: &'a CacheKey,
    ) -> BoxFuture<'a, Result<Option<CacheEntry>, CacheError>> {
        Box::pin(async move { Ok(self.lookup(key).await) })
    }

    fn set(
        &self,
        key: CacheKey,
        result: RouteResult,
        ttl: Option<Duration>,
    ) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move {
            self.insert(key, result, ttl).await;
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move {
            self.entries.invalidate_all();
            self.entries.run_pending_tasks().await;
            Ok(())
        })
    }

    fn cleanup(&self) -> BoxFuture<'_, usize> {
        Box::pin(MemoryStore::cleanup(self))
    }
}
