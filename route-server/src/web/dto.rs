//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, RouteResult};

/// Query string for `GET /route`.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
}

impl RouteRequest {
    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.from_lat, self.from_lng)
    }

    pub fn destination(&self) -> Coordinate {
        Coordinate::new(self.to_lat, self.to_lng)
    }
}

/// A resolved route with display-friendly units alongside the raw ones.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    #[serde(flatten)]
    pub route: RouteResult,

    /// Distance in kilometres, one decimal place
    pub distance_km: f64,

    /// Duration in whole minutes, rounded
    pub duration_minutes: f64,
}

impl RouteResponse {
    pub fn from_route(route: RouteResult) -> Self {
        Self {
            distance_km: (route.distance_km() * 10.0).round() / 10.0,
            duration_minutes: route.duration_minutes().round(),
            route,
        }
    }
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
