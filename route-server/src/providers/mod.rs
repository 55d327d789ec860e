//! Routing backends.
//!
//! Each provider turns an origin/destination pair into a [`RouteResult`] or
//! a typed [`ProviderError`]. The resolver holds them as trait objects in a
//! fixed fallback order:
//!
//! 1. [`OsrmProvider`] - GET with coordinates in the path, confidence 0.9
//! 2. [`ValhallaProvider`] - POST with a JSON body, confidence 0.8
//! 3. [`HaversineProvider`] - great-circle estimate, confidence 0.5, cannot
//!    fail on valid input

use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::domain::{Coordinate, RouteResult, RouteSource};

mod config;
mod error;
mod haversine;
pub mod http;
mod osrm;
pub mod polyline;
mod rate_limit;
mod valhalla;

pub use config::{
    DEFAULT_OSRM_URL, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_TIMEOUT, DEFAULT_VALHALLA_URL,
    ProviderConfig,
};
pub use error::ProviderError;
pub use haversine::{AVERAGE_SPEED_KMH, HaversineProvider};
pub use osrm::OsrmProvider;
pub use polyline::PolylineError;
pub use rate_limit::{MAX_INTERVAL, RateLimiter};
pub use valhalla::ValhallaProvider;

/// Identity of a routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Osrm,
    Valhalla,
    Haversine,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Osrm => "osrm",
            ProviderId::Valhalla => "valhalla",
            ProviderId::Haversine => "haversine",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProviderId> for RouteSource {
    fn from(id: ProviderId) -> Self {
        match id {
            ProviderId::Osrm => RouteSource::Osrm,
            ProviderId::Valhalla => RouteSource::Valhalla,
            ProviderId::Haversine => RouteSource::Haversine,
        }
    }
}

/// A backend capable of computing a route between two points.
///
/// Futures are boxed so heterogeneous providers can sit in one chain.
pub trait RouteProvider: Send + Sync {
    /// Which provider this is.
    fn id(&self) -> ProviderId;

    /// Compute a route from `origin` to `destination`.
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, ProviderError>>;
}

/// Reject invalid endpoints before any request is made.
pub(crate) fn check_endpoints(
    origin: &Coordinate,
    destination: &Coordinate,
) -> Result<(), ProviderError> {
    if origin.is_valid() && destination.is_valid() {
        Ok(())
    } else {
        Err(ProviderError::InvalidInput)
    }
}
