//! Resolution counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::providers::ProviderId;

/// Live counters updated by every resolution.
#[derive(Debug, Default)]
pub struct ResolverStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    osrm: AtomicU64,
    valhalla: AtomicU64,
    haversine: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`ResolverStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub osrm: u64,
    pub valhalla: u64,
    pub haversine: u64,
    pub failures: u64,
    /// Share of lookups answered from cache, 0 when nothing was looked up.
    pub hit_rate: f64,
}

impl ResolverStats {
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_win(&self, provider: ProviderId) {
        let counter = match provider {
            ProviderId::Osrm => &self.osrm,
            ProviderId::Valhalla => &self.valhalla,
            ProviderId::Haversine => &self.haversine,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = cache_hits + cache_misses;

        StatsSnapshot {
            cache_hits,
            cache_misses,
            osrm: self.osrm.load(Ordering::Relaxed),
            valhalla: self.valhalla.load(Ordering::Relaxed),
            haversine: self.haversine.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                cache_hits as f64 / lookups as f64
            },
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.osrm,
            &self.valhalla,
            &self.haversine,
            &self.failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
