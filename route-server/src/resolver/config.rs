//! Resolver configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::providers::ProviderConfig;

/// Everything needed to build a [`RouteResolver`](super::RouteResolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Primary backend.
    pub osrm: ProviderConfig,

    /// Secondary backend.
    pub valhalla: ProviderConfig,

    /// Cache tiers.
    pub cache: CacheConfig,

    /// Destinations resolved at once by `resolve_many`.
    pub batch_concurrency: usize,
}

impl ResolverConfig {
    /// Apply the same request timeout to both network backends.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.osrm = self.osrm.with_timeout(timeout);
        self.valhalla = self.valhalla.with_timeout(timeout);
        self
    }

    /// Apply the same request rate to both network backends.
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.osrm = self.osrm.with_requests_per_second(rps);
        self.valhalla = self.valhalla.with_requests_per_second(rps);
        self
    }

    pub fn with_osrm_url(mut self, url: impl Into<String>) -> Self {
        self.osrm = self.osrm.with_base_url(url);
        self
    }

    pub fn with_valhalla_url(mut self, url: impl Into<String>) -> Self {
        self.valhalla = self.valhalla.with_base_url(url);
        self
    }

    /// Back the persistent cache tier with `path`.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache = self.cache.with_persistent_path(path);
        self
    }

    /// Disable the persistent cache tier.
    pub fn without_cache_path(mut self) -> Self {
        self.cache = self.cache.without_persistent_path();
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            osrm: ProviderConfig::osrm(),
            valhalla: ProviderConfig::valhalla(),
            cache: CacheConfig::default(),
            batch_concurrency: 3,
        }
    }
}
