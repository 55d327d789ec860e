//! The cache store capability shared by every tier.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::domain::RouteResult;

use super::error::CacheError;
use super::key::CacheKey;

/// A cached route with its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub result: RouteResult,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: CacheKey, result: RouteResult, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key,
            result,
            created_at,
            ttl,
        }
    }

    /// Expired once strictly more than `ttl` has passed since creation.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_none()
    }

    /// Lifetime left at `now`, or `None` if expired.
    ///
    /// A `created_at` in the future (clock skew) counts as freshly created.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let age = (now - self.created_at).to_std().unwrap_or(Duration::ZERO);
        if age > self.ttl {
            None
        } else {
            Some(self.ttl - age)
        }
    }
}

/// One tier of the route cache.
///
/// Implementations must tolerate concurrent use; overlapping writes to the
/// same key are last-writer-wins.
pub trait CacheStore: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Lifetime given to entries stored without an explicit TTL.
    fn default_ttl(&self) -> Duration;

    /// Whether the backing storage can be used right now.
    fn is_available(&self) -> BoxFuture<'_, bool>;

    /// Fetch a live entry. Expired entries read as `None`.
    fn get<'a>(&'a self, key: &'a CacheKey)
    -> BoxFuture<'a, Result<Option<CacheEntry>, CacheError>>;

    /// Store a result, replacing any previous entry for the key.
    fn set(
        &self,
        key: CacheKey,
        result: RouteResult,
        ttl: Option<Duration>,
    ) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Remove every entry.
    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Drop expired entries, returning how many were removed.
    ///
    /// Stores that expire lazily only may keep the default.
    fn cleanup(&self) -> BoxFuture<'_, usize> {
        Box::pin(async { 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, RouteSource};

    fn entry(created_at: DateTime<Utc>, ttl: Duration) -> CacheEntry {
        let origin = Coordinate::new(48.7758, 9.1829);
        let destination = Coordinate::new(49.0069, 8.4037);
        let result = RouteResult::new(
            origin,
            destination,
            1.0,
            1.0,
            Vec::new(),
            RouteSource::Haversine,
            0.5,
        );
        CacheEntry::new(CacheKey::new(origin, destination, 4), result, created_at, ttl)
    }

    #[test]
    fn expiry_is_strictly_after_ttl() {
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let entry = entry(t0, Duration::from_millis(1000));

        assert!(!entry.is_expired(t0));
        assert!(!entry.is_expired(t0 + chrono::Duration::milliseconds(1000)));
        assert!(entry.is_expired(t0 + chrono::Duration::milliseconds(1001)));
        assert!(entry.is_expired(t0 + chrono::Duration::milliseconds(1100)));
    }

    #[test]
    fn remaining_lifetime() {
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let entry = entry(t0, Duration::from_secs(60));

        assert_eq!(
            entry.remaining(t0 + chrono::Duration::seconds(15)),
            Some(Duration::from_secs(45))
        );
        // Future timestamps are treated as age zero.
        assert_eq!(
            entry.remaining(t0 - chrono::Duration::seconds(5)),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn entry_serializes() {
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let entry = entry(t0, Duration::from_secs(3600));
        let json = serde_json::to_string(&entry).unwrap();
        let back: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
