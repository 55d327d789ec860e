//! Core value types for route resolution.
//!
//! Coordinates are validated before they reach any provider or cache, so
//! code further down can assume finite, in-range values.

mod coordinate;
mod route;

pub use coordinate::{Coordinate, EARTH_RADIUS_M, InvalidCoordinate, is_valid};
pub use route::{RouteResult, RouteSource};
