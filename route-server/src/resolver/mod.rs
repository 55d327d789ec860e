//! Route resolution with provider fallback and caching.
//!
//! A resolution validates both endpoints, consults the [`TieredCache`], and
//! on a miss walks the provider chain in order until one of them answers.
//! Every provider call passes through that provider's [`RateLimiter`]. A
//! provider that is rate limited, unreachable, or has no route is recorded
//! and skipped immediately; nothing waits inline for a backend to recover.

mod config;
mod stats;


use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, Clock, FileStore, MemoryStore, SystemClock, TieredCache};
use crate::cache::{CacheStore, DEFAULT_PRECISION};
use crate::domain::{Coordinate, InvalidCoordinate, RouteResult};
use crate::providers::{
    HaversineProvider, OsrmProvider, ProviderError, RateLimiter, RouteProvider, ValhallaProvider,
};

pub use config::ResolverConfig;
pub use stats::{ResolverStats, StatsSnapshot};

/// Errors surfaced to callers of the resolver.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// An endpoint failed validation. No provider or cache was consulted.
    #[error("invalid {endpoint}: {source}")]
    InvalidInput {
        endpoint: &'static str,
        #[source]
        source: InvalidCoordinate,
    },

    /// Every provider in the chain failed.
    #[error("all {} routing providers failed", .0.len())]
    RoutingFailed(Vec<ProviderError>),

    /// The caller cancelled the resolution.
    #[error("route resolution cancelled")]
    Cancelled,
}

/// One link of the provider chain.
#[derive(Clone)]
pub struct ProviderSlot {
    pub provider: Arc<dyn RouteProvider>,
    pub limiter: Arc<RateLimiter>,
}

impl ProviderSlot {
    pub fn new(provider: Arc<dyn RouteProvider>, limiter: Arc<RateLimiter>) -> Self {
        Self { provider, limiter }
    }

    /// A slot whose provider is never throttled.
    pub fn unlimited(provider: Arc<dyn RouteProvider>) -> Self {
        Self::new(provider, Arc::new(RateLimiter::unlimited()))
    }
}

/// A resolved route plus the failures of the providers tried before it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub result: RouteResult,
    pub attempts: Vec<ProviderError>,
}

/// Resolves routes through the cache and the provider chain.
pub struct RouteResolver {
    providers: Vec<ProviderSlot>,
    cache: TieredCache,
    key_precision: u32,
    batch_concurrency: usize,
    stats: ResolverStats,
}

impl RouteResolver {
    /// Assemble a resolver from an explicit provider chain and cache.
    pub fn from_parts(providers: Vec<ProviderSlot>, cache: TieredCache) -> Self {
        Self {
            providers,
            cache,
            key_precision: DEFAULT_PRECISION,
            batch_concurrency: 3,
            stats: ResolverStats::default(),
        }
    }

    /// Build the standard OSRM, Valhalla, haversine chain over a memory tier
    /// and, when a path is configured, a file tier.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ProviderError> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(
        config: &ResolverConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProviderError> {
        let osrm = OsrmProvider::new(&config.osrm)?;
        let valhalla = ValhallaProvider::new(&config.valhalla)?;

        let providers = vec![
            ProviderSlot::new(
                Arc::new(osrm),
                Arc::new(RateLimiter::new(config.osrm.requests_per_second)),
            ),
            ProviderSlot::new(
                Arc::new(valhalla),
                Arc::new(RateLimiter::new(config.valhalla.requests_per_second)),
            ),
            ProviderSlot::unlimited(Arc::new(HaversineProvider::new())),
        ];

        let mut stores: Vec<Arc<dyn CacheStore>> = vec![Arc::new(MemoryStore::new(
            config.cache.memory_capacity,
            config.cache.memory_ttl,
            clock.clone(),
        ))];
        if let Some(path) = &config.cache.persistent_path {
            stores.push(Arc::new(FileStore::new(
                path,
                config.cache.persistent_ttl,
                clock.clone(),
            )));
        }

        Ok(Self::from_parts(providers, TieredCache::new(stores, clock))
            .with_key_precision(config.cache.key_precision)
            .with_batch_concurrency(config.batch_concurrency))
    }

    pub fn with_key_precision(mut self, precision: u32) -> Self {
        self.key_precision = precision;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    /// Resolve a route from `origin` to `destination`.
    ///
    /// Cache hits come back tagged [`RouteSource::Cache`]; fresh results
    /// carry the tag of the provider that produced them.
    ///
    /// [`RouteSource::Cache`]: crate::domain::RouteSource::Cache
    pub async fn resolve_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, RouteError> {
        self.resolve(origin, destination, None)
            .await
            .map(|resolution| resolution.result)
    }

    /// Like [`resolve_route`](Self::resolve_route), also returning the
    /// errors of providers that were tried and skipped.
    pub async fn resolve_route_detailed(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Resolution, RouteError> {
        self.resolve(origin, destination, None).await
    }

    /// Resolve until `cancel` fires.
    ///
    /// On cancellation the in-flight provider request is dropped, no further
    /// providers are tried and nothing is written to the cache.
    pub async fn resolve_route_cancellable(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        cancel: &CancellationToken,
    ) -> Result<RouteResult, RouteError> {
        self.resolve(origin, destination, Some(cancel))
            .await
            .map(|resolution| resolution.result)
    }

    async fn resolve(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        cancel: Option<&CancellationToken>,
    ) -> Result<Resolution, RouteError> {
        origin.validate().map_err(|source| RouteError::InvalidInput {
            endpoint: "origin",
            source,
        })?;
        destination
            .validate()
            .map_err(|source| RouteError::InvalidInput {
                endpoint: "destination",
                source,
            })?;

        let key = CacheKey::new(origin, destination, self.key_precision);
        if let Some(cached) = self.cache.lookup(&key).await {
            self.stats.record_hit();
            return Ok(Resolution {
                result: cached.into_cached(),
                attempts: Vec::new(),
            });
        }
        self.stats.record_miss();

        let mut attempts = Vec::new();
        for slot in &self.providers {
            let provider = slot.provider.id();
            let attempt = slot
                .limiter
                .throttle(|| slot.provider.route(origin, destination));

            let outcome = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(%provider, "resolution cancelled");
                        return Err(RouteError::Cancelled);
                    }
                    outcome = attempt => outcome,
                },
                None => attempt.await,
            };

            match outcome {
                Ok(result) => {
                    if cancel.is_some_and(CancellationToken::is_cancelled) {
                        return Err(RouteError::Cancelled);
                    }
                    debug!(
                        %provider,
                        distance_m = result.distance_meters,
                        fallbacks = attempts.len(),
                        "route resolved"
                    );
                    self.cache.store(&key, &result, None).await;
                    self.stats.record_win(provider);
                    return Ok(Resolution { result, attempts });
                }
                Err(e) => {
                    warn!(%provider, error = %e, "provider failed, falling back");
                    attempts.push(e);
                }
            }
        }

        self.stats.record_failure();
        Err(RouteError::RoutingFailed(attempts))
    }

    /// Resolve routes from `origin` to each destination, a few at a time.
    ///
    /// Failed destinations are logged and left out. The rest come back
    /// paired with their destination, shortest first.
    pub async fn resolve_many(
        &self,
        origin: Coordinate,
        destinations: impl IntoIterator<Item = Coordinate>,
    ) -> Vec<(Coordinate, RouteResult)> {
        let mut routes: Vec<(Coordinate, RouteResult)> = stream::iter(destinations)
            .map(|destination| async move {
                (destination, self.resolve_route(origin, destination).await)
            })
            .buffer_unordered(self.batch_concurrency)
            .filter_map(|(destination, outcome)| async move {
                match outcome {
                    Ok(route) => Some((destination, route)),
                    Err(e) => {
                        warn!(?destination, error = %e, "dropping unresolved destination");
                        None
                    }
                }
            })
            .collect()
            .await;

        routes.sort_by(|a, b| a.1.distance_meters.total_cmp(&b.1.distance_meters));
        routes
    }

    /// Empty every cache tier.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("route cache cleared");
    }

    /// Drop expired cache entries, returning how many were removed.
    pub async fn cleanup_cache(&self) -> usize {
        self.cache.cleanup().await
    }

    /// Sweep the cache every `every` until the returned task is aborted.
    pub fn spawn_cache_cleanup(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                let removed = self.cleanup_cache().await;
                if removed > 0 {
                    info!(removed, "swept expired route cache entries");
                }
            }
        })
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}
