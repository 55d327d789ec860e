//! Geographic coordinate type and validation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres, as used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Error returned when a latitude/longitude pair is not a usable coordinate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({lat}, {lng}): {reason}")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lng: f64,
    reason: &'static str,
}

/// A WGS84 point.
///
/// Construction through [`Coordinate::parse`] guarantees the range
/// invariants; [`Coordinate::new`] does not check, so values arriving from
/// callers must go through [`Coordinate::is_valid`] before use.
///
/// # Examples
///
/// ```
/// use route_server::domain::Coordinate;
///
/// let stuttgart = Coordinate::parse(48.7758, 9.1829).unwrap();
/// assert!(stuttgart.is_valid());
///
/// assert!(Coordinate::parse(91.0, 0.0).is_err());
/// assert!(Coordinate::parse(f64::NAN, 0.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate without validating it.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn parse(lat: f64, lng: f64) -> Result<Self, InvalidCoordinate> {
        let coord = Self { lat, lng };
        coord.validate().map(|()| coord)
    }

    /// Check the coordinate invariants, returning the first violation.
    pub fn validate(&self) -> Result<(), InvalidCoordinate> {
        let reason = if !self.lat.is_finite() || !self.lng.is_finite() {
            "latitude and longitude must be finite"
        } else if !(-90.0..=90.0).contains(&self.lat) {
            "latitude must be within [-90, 90]"
        } else if !(-180.0..=180.0).contains(&self.lng) {
            "longitude must be within [-180, 180]"
        } else {
            return Ok(());
        };

        Err(InvalidCoordinate {
            lat: self.lat,
            lng: self.lng,
            reason,
        })
    }

    /// Returns true if both components are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Great-circle distance to `other` in metres (haversine formula).
    pub fn haversine_distance(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.lat, self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Free-standing form of [`Coordinate::is_valid`].
pub fn is_valid(lat: f64, lng: f64) -> bool {
    Coordinate::new(lat, lng).is_valid()
}
