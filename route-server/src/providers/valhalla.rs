//! Valhalla route client.
//!
//! Requests are POSTed as JSON. Leg summaries come back in kilometres (as
//! requested via `directions_options.units`) and seconds, and each leg's
//! shape is an encoded polyline.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Coordinate, RouteResult, RouteSource};

use super::config::ProviderConfig;
use super::error::ProviderError;
use super::http::{build_client, send_json};
use super::polyline;
use super::{ProviderId, RouteProvider, check_endpoints};

const CONFIDENCE: f64 = 0.8;

#[derive(Debug, Serialize)]
struct ValhallaRequest {
    locations: [Location; 2],
    costing: &'static str,
    directions_options: DirectionsOptions,
}

#[derive(Debug, Serialize)]
struct Location {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct DirectionsOptions {
    units: &'static str,
}

#[derive(Debug, Deserialize)]
struct ValhallaResponse {
    #[serde(default)]
    trip: Option<Trip>,
}

#[derive(Debug, Deserialize)]
struct Trip {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    summary: Summary,
    #[serde(default)]
    shape: String,
}

#[derive(Debug, Deserialize)]
struct Summary {
    /// Kilometres.
    length: f64,
    /// Seconds.
    time: f64,
}

/// Client for a Valhalla `route` service.
#[derive(Debug, Clone)]
pub struct ValhallaProvider {
    http: reqwest::Client,
    base_url: String,
}

impl ValhallaProvider {
    /// Create a client for the configured backend.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_client(ProviderId::Valhalla, config.timeout)?,
            base_url: config.base_url.clone(),
        })
    }

    async fn fetch(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, ProviderError> {
        check_endpoints(&origin, &destination)?;

        let url = format!("{}/route", self.base_url);
        debug!(%url, %origin, %destination, "requesting Valhalla route");

        let request = self.http.post(&url).json(&request_body(origin, destination));
        let response: ValhallaResponse = send_json(ProviderId::Valhalla, request).await?;
        into_route(response, origin, destination)
    }
}

impl RouteProvider for ValhallaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Valhalla
    }

    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, ProviderError>> {
        Box::pin(self.fetch(origin, destination))
    }
}

fn request_body(origin: Coordinate, destination: Coordinate) -> ValhallaRequest {
    ValhallaRequest {
        locations: [
            Location {
                lat: origin.lat,
                lon: origin.lng,
            },
            Location {
                lat: destination.lat,
                lon: destination.lng,
            },
        ],
        costing: "auto",
        directions_options: DirectionsOptions {
            units: "kilometers",
        },
    }
}

fn into_route(
    response: ValhallaResponse,
    origin: Coordinate,
    destination: Coordinate,
) -> Result<RouteResult, ProviderError> {
    let legs = response
        .trip
        .map(|trip| trip.legs)
        .filter(|legs| !legs.is_empty())
        .ok_or(ProviderError::NoRouteFound {
            provider: ProviderId::Valhalla,
        })?;

    let mut distance_km = 0.0;
    let mut duration_s = 0.0;
    let mut geometry: Vec<Coordinate> = Vec::new();

    for leg in &legs {
        distance_km += leg.summary.length;
        duration_s += leg.summary.time;

        let points = polyline::decode(&leg.shape).map_err(|e| {
            ProviderError::unknown(ProviderId::Valhalla, format!("bad leg shape: {e}"))
        })?;
        // Consecutive legs share their joining point.
        let skip = usize::from(geometry.last().is_some() && geometry.last() == points.first());
        geometry.extend(points.into_iter().skip(skip));
    }

    Ok(RouteResult::new(
        origin,
        destination,
        distance_km * 1000.0,
        duration_s,
        geometry,
        RouteSource::Valhalla,
        CONFIDENCE,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Coordinate {
        Coordinate::new(48.7758, 9.1829)
    }

    fn destination() -> Coordinate {
        Coordinate::new(49.0069, 8.4037)
    }

    fn parse(json: &str) -> Result<RouteResult, ProviderError> {
        let response: ValhallaResponse = serde_json::from_str(json).unwrap();
        into_route(response, origin(), destination())
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(request_body(origin(), destination())).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "locations": [
                    { "lat": 48.7758, "lon": 9.1829 },
                    { "lat": 49.0069, "lon": 8.4037 }
                ],
                "costing": "auto",
                "directions_options": { "units": "kilometers" }
            })
        );
    }

    #[test]
    fn converts_kilometres_to_metres() {
        let result = parse(
            r#"{
                "trip": {
                    "legs": [
                        { "summary": { "length": 80.0, "time": 3600.0 }, "shape": "_p~iF~ps|U_ulLnnqC" }
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(result.distance_meters, 80_000.0);
        assert_eq!(result.duration_seconds, 3600.0);
        assert_eq!(result.provider, RouteSource::Valhalla);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.geometry.len(), 2);
        assert!((result.geometry[0].lat - 38.5).abs() < 1e-9);
    }

    #[test]
    fn multiple_legs_are_summed_and_joined() {
        // Second leg starts where the first ends: (40.7, -120.95).
        let result = parse(
            r#"{
                "trip": {
                    "legs": [
                        { "summary": { "length": 1.5, "time": 100.0 }, "shape": "_p~iF~ps|U_ulLnnqC" },
                        { "summary": { "length": 2.5, "time": 200.0 }, "shape": "_flwFn`faV_mqNvxq`@" }
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(result.distance_meters, 4000.0);
        assert_eq!(result.duration_seconds, 300.0);
        assert_eq!(result.geometry.len(), 3);
    }

    #[test]
    fn missing_or_empty_legs_are_no_route() {
        for body in [r#"{}"#, r#"{ "trip": {} }"#, r#"{ "trip": { "legs": [] } }"#] {
            let err = parse(body).unwrap_err();
            assert_eq!(
                err,
                ProviderError::NoRouteFound {
                    provider: ProviderId::Valhalla
                },
                "body: {body}"
            );
        }
    }

    #[test]
    fn corrupt_shape_is_unknown() {
        let err = parse(
            r#"{ "trip": { "legs": [ { "summary": { "length": 1.0, "time": 1.0 }, "shape": "_" } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Unknown { provider: ProviderId::Valhalla, .. }));
    }

    #[test]
    fn empty_shape_uses_endpoints() {
        let result = parse(
            r#"{ "trip": { "legs": [ { "summary": { "length": 1.0, "time": 1.0 } } ] } }"#,
        )
        .unwrap();
        assert_eq!(result.geometry, vec![origin(), destination()]);
    }
}
