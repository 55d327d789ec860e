//! OSRM route client.
//!
//! Coordinates travel in the URL path as `lng,lat;lng,lat`. The response
//! already reports metres and seconds; geometry is requested as GeoJSON so
//! no decoding is needed.

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{Coordinate, RouteResult, RouteSource};

use super::config::ProviderConfig;
use super::error::ProviderError;
use super::http::{build_client, send_json};
use super::{ProviderId, RouteProvider, check_endpoints};

const CONFIDENCE: f64 = 0.9;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: Option<LineString>,
}

#[derive(Debug, Deserialize)]
struct LineString {
    /// GeoJSON order: `[lng, lat]`.
    coordinates: Vec<[f64; 2]>,
}

/// Client for an OSRM `route` service.
#[derive(Debug, Clone)]
pub struct OsrmProvider {
    http: reqwest::Client,
    base_url: String,
}

impl OsrmProvider {
    /// Create a client for the configured backend.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_client(ProviderId::Osrm, config.timeout)?,
            base_url: config.base_url.clone(),
        })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }

    async fn fetch(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, ProviderError> {
        check_endpoints(&origin, &destination)?;

        let url = self.route_url(origin, destination);
        debug!(%url, "requesting OSRM route");

        let request = self
            .http
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")]);

        let response: OsrmResponse = send_json(ProviderId::Osrm, request).await?;
        into_route(response, origin, destination)
    }
}

impl RouteProvider for OsrmProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Osrm
    }

    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, ProviderError>> {
        Box::pin(self.fetch(origin, destination))
    }
}

fn into_route(
    response: OsrmResponse,
    origin: Coordinate,
    destination: Coordinate,
) -> Result<RouteResult, ProviderError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(ProviderError::NoRouteFound {
            provider: ProviderId::Osrm,
        })?;

    let geometry = route
        .geometry
        .map(|line| {
            line.coordinates
                .into_iter()
                .map(|[lng, lat]| Coordinate::new(lat, lng))
                .collect()
        })
        .unwrap_or_default();

    Ok(RouteResult::new(
        origin,
        destination,
        route.distance,
        route.duration,
        geometry,
        RouteSource::Osrm,
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
        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        into_route(response, origin(), destination())
    }

    #[test]
    fn parses_first_route() {
        let result = parse(
            r#"{
                "code": "Ok",
                "routes": [
                    {
                        "distance": 81234.5,
                        "duration": 3300.2,
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [[9.1829, 48.7758], [8.9, 48.9], [8.4037, 49.0069]]
                        }
                    },
                    { "distance": 90000.0, "duration": 4000.0 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(result.distance_meters, 81234.5);
        assert_eq!(result.duration_seconds, 3300.2);
        assert_eq!(result.provider, RouteSource::Osrm);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.geometry.len(), 3);
        assert_eq!(result.geometry[1], Coordinate::new(48.9, 8.9));
    }

    #[test]
    fn empty_route_list_is_no_route() {
        let err = parse(r#"{ "code": "Ok", "routes": [] }"#).unwrap_err();
        assert_eq!(
            err,
            ProviderError::NoRouteFound {
                provider: ProviderId::Osrm
            }
        );

        let err = parse(r#"{ "code": "NoRoute" }"#).unwrap_err();
        assert!(matches!(err, ProviderError::NoRouteFound { .. }));
    }

    #[test]
    fn missing_geometry_falls_back_to_endpoints() {
        let result = parse(r#"{ "routes": [{ "distance": 10.0, "duration": 2.0 }] }"#).unwrap();
        assert_eq!(result.geometry, vec![origin(), destination()]);
    }

    #[test]
    fn url_puts_longitude_first() {
        let provider = OsrmProvider::new(&ProviderConfig::osrm().with_base_url("http://osrm.test"))
            .unwrap();
        assert_eq!(
            provider.route_url(origin(), destination()),
            "http://osrm.test/route/v1/driving/9.1829,48.7758;8.4037,49.0069"
        );
    }

    #[tokio::test]
    async fn invalid_coordinates_skip_the_network() {
        // Unroutable base URL: reaching the network would yield TransportBlocked.
        let provider =
            OsrmProvider::new(&ProviderConfig::osrm().with_base_url("http://127.0.0.1:9")).unwrap();
        let err = provider
            .route(Coordinate::new(f64::NAN, 0.0), destination())
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::InvalidInput);
    }
}
