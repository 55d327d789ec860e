//! Deterministic great-circle fallback.

use futures::future::BoxFuture;

use crate::domain::{Coordinate, RouteResult, RouteSource};

use super::error::ProviderError;
use super::{ProviderId, RouteProvider, check_endpoints};

/// Assumed travel speed for duration estimates.
pub const AVERAGE_SPEED_KMH: f64 = 50.0;

const CONFIDENCE: f64 = 0.5;

/// Estimates routes as the straight great-circle line between the points.
///
/// Has no external dependency, so it terminates the fallback chain.
#[derive(Debug, Clone)]
pub struct HaversineProvider {
    average_speed_kmh: f64,
}

impl HaversineProvider {
    pub fn new() -> Self {
        Self {
            average_speed_kmh: AVERAGE_SPEED_KMH,
        }
    }

    /// Use a different assumed speed.
    pub fn with_average_speed(mut self, kmh: f64) -> Self {
        self.average_speed_kmh = kmh;
        self
    }

    /// Synchronous estimate; only fails on invalid coordinates.
    pub fn estimate(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, ProviderError> {
        check_endpoints(&origin, &destination)?;

        let distance = origin.haversine_distance(&destination);
        let duration = distance / 1000.0 / self.average_speed_kmh * 3600.0;

        Ok(RouteResult::new(
            origin,
            destination,
            distance,
            duration,
            vec![origin, destination],
            RouteSource::Haversine,
            CONFIDENCE,
        ))
    }
}

impl Default for HaversineProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteProvider for HaversineProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Haversine
    }

    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, ProviderError>> {
        let result = self.estimate(origin, destination);
        Box::pin(async move { result })
    }
}
