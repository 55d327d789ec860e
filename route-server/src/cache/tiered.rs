//! Read-through / write-through over an ordered list of stores.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::RouteResult;

use super::clock::Clock;
use super::key::CacheKey;
use super::store::{CacheEntry, CacheStore};

/// Ordered cache tiers, fastest first.
///
/// Store failures never surface to the caller: a tier that errors or is
/// unavailable is skipped and the operation continues with the rest.
pub struct TieredCache {
    stores: Vec<Arc<dyn CacheStore>>,
    clock: Arc<dyn Clock>,
}

impl TieredCache {
    pub fn new(stores: Vec<Arc<dyn CacheStore>>, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    /// The stores in lookup order.
    pub fn stores(&self) -> &[Arc<dyn CacheStore>] {
        &self.stores
    }

    /// Find `key` in the first tier that has it, copying the entry into every
    /// earlier tier on the way out.
    pub async fn lookup(&self, key: &CacheKey) -> Option<RouteResult> {
        for (index, store) in self.stores.iter().enumerate() {
            if !store.is_available().await {
                continue;
            }

            let entry = match store.get(key).await {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) => {
                    warn!(store = store.name(), %key, error = %e, "cache read failed");
                    continue;
                }
            };

            debug!(store = store.name(), %key, "cache hit");
            self.backfill(&self.stores[..index], &entry).await;
            return Some(entry.result);
        }

        debug!(%key, "cache miss");
        None
    }

    async fn backfill(&self, earlier: &[Arc<dyn CacheStore>], entry: &CacheEntry) {
        let Some(remaining) = entry.remaining(self.clock.now()) else {
            return;
        };

        for store in earlier {
            if !store.is_available().await {
                continue;
            }
            let ttl = remaining.min(store.default_ttl());
            if let Err(e) = store
                .set(entry.key.clone(), entry.result.clone(), Some(ttl))
                .await
            {
                warn!(store = store.name(), key = %entry.key, error = %e, "cache backfill failed");
            }
        }
    }

    /// Write `result` to every available tier. `ttl` of `None` uses each
    /// store's default.
    pub async fn store(&self, key: &CacheKey, result: &RouteResult, ttl: Option<Duration>) {
        for store in &self.stores {
            if !store.is_available().await {
                continue;
            }
            if let Err(e) = store.set(key.clone(), result.clone(), ttl).await {
                warn!(store = store.name(), %key, error = %e, "cache write failed");
            }
        }
    }

    /// Empty every available tier.
    pub async fn clear(&self) {
        for store in &self.stores {
            if !store.is_available().await {
                continue;
            }
            if let Err(e) = store.clear().await {
                warn!(store = store.name(), error = %e, "cache clear failed");
            }
        }
    }

    /// Sweep expired entries from every tier, returning the total removed.
    pub async fn cleanup(&self) -> usize {
        let mut removed = 0;
        for store in &self.stores {
            if store.is_available().await {
                removed += store.cleanup().await;
            }
        }
        removed
    }
}
