//! Route results returned by providers and the resolver.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Where a [`RouteResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// OSRM-style primary backend.
    Osrm,
    /// Valhalla-style secondary backend.
    Valhalla,
    /// Great-circle estimate.
    Haversine,
    /// Served from the route cache.
    Cache,
}

impl RouteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteSource::Osrm => "osrm",
            RouteSource::Valhalla => "valhalla",
            RouteSource::Haversine => "haversine",
            RouteSource::Cache => "cache",
        }
    }
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved route between two points.
///
/// Distances are metres and durations seconds regardless of the units the
/// backend reports in. `geometry` always holds at least the two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub geometry: Vec<Coordinate>,
    pub provider: RouteSource,
    /// Provider-intrinsic quality score in (0, 1].
    pub confidence: f64,
}

impl RouteResult {
    /// Build a result, substituting the straight origin → destination line
    /// when the backend supplied fewer than two geometry points.
    pub fn new(
        origin: Coordinate,
        destination: Coordinate,
        distance_meters: f64,
        duration_seconds: f64,
        geometry: Vec<Coordinate>,
        provider: RouteSource,
        confidence: f64,
    ) -> Self {
        let geometry = if geometry.len() < 2 {
            vec![origin, destination]
        } else {
            geometry
        };

        Self {
            distance_meters: distance_meters.max(0.0),
            duration_seconds: duration_seconds.max(0.0),
            geometry,
            provider,
            confidence,
        }
    }

    /// Re-tag a stored result as served from cache.
    pub fn into_cached(mut self) -> Self {
        self.provider = RouteSource::Cache;
        self
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}
