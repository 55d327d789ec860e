//! Route cache configuration.

use std::path::PathBuf;
use std::time::Duration;

use super::key::DEFAULT_PRECISION;

/// File backing the persistent tier unless configured otherwise.
pub const DEFAULT_PERSISTENT_PATH: &str = "route-cache.json";

/// Configuration for the two cache tiers.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the in-process tier.
    pub memory_capacity: u64,

    /// TTL for in-process entries.
    pub memory_ttl: Duration,

    /// TTL for persistent entries.
    pub persistent_ttl: Duration,

    /// File backing the persistent tier. Defaults to
    /// [`DEFAULT_PERSISTENT_PATH`]; `None` disables the tier.
    pub persistent_path: Option<PathBuf>,

    /// Decimal places kept when building cache keys.
    pub key_precision: u32,

    /// How often expired in-process entries are swept.
    pub cleanup_interval: Duration,
}

impl CacheConfig {
    /// Set the in-process tier capacity.
    pub fn with_memory_capacity(mut self, capacity: u64) -> Self {
        self.memory_capacity = capacity;
        self
    }

    /// Set the in-process TTL.
    pub fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory_ttl = ttl;
        self
    }

    /// Set the persistent TTL.
    pub fn with_persistent_ttl(mut self, ttl: Duration) -> Self {
        self.persistent_ttl = ttl;
        self
    }

    /// Enable the persistent tier at `path`.
    pub fn with_persistent_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistent_path = Some(path.into());
        self
    }

    /// Run with the in-process tier only.
    pub fn without_persistent_path(mut self) -> Self {
        self.persistent_path = None;
        self
    }

    /// Set the key rounding precision.
    pub fn with_key_precision(mut self, precision: u32) -> Self {
        self.key_precision = precision;
        self
    }

    /// Set the sweep interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 100,
            memory_ttl: Duration::from_secs(15 * 60),
            persistent_ttl: Duration::from_secs(60 * 60),
            persistent_path: Some(PathBuf::from(DEFAULT_PERSISTENT_PATH)),
            key_precision: DEFAULT_PRECISION,
            cleanup_interval: Duration::from_secs(5 * 60),
        }
    }
}
