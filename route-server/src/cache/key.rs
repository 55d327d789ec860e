//! Normalised cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;

/// Default rounding: 4 decimal places is roughly 11 m.
pub const DEFAULT_PRECISION: u32 = 4;

/// Finest precision a key distinguishes. Larger values are clamped, as an
/// `f64` carries no more significant decimals than this.
pub const MAX_PRECISION: u32 = 15;

/// Discriminator used when any provider's answer may serve the query.
pub const ANY_PROVIDER: &str = "any";

/// Cache key for an origin/destination pair.
///
/// Coordinates are scaled to integers at the configured precision before
/// formatting, so inputs that round to the same values always produce the
/// same key regardless of floating-point noise.
///
/// # Examples
///
/// ```
/// use route_server::cache::CacheKey;
/// use route_server::domain::Coordinate;
///
/// let a = CacheKey::new(Coordinate::new(48.77580001, 9.1829), Coordinate::new(49.0069, 8.4037), 4);
/// let b = CacheKey::new(Coordinate::new(48.77579998, 9.18290002), Coordinate::new(49.0069, 8.4037), 4);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "any:48.7758,9.1829:49.0069,8.4037");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for any provider at the given precision.
    pub fn new(origin: Coordinate, destination: Coordinate, precision: u32) -> Self {
        Self::with_discriminator(ANY_PROVIDER, origin, destination, precision)
    }

    /// Key scoped to a specific provider.
    pub fn with_discriminator(
        discriminator: &str,
        origin: Coordinate,
        destination: Coordinate,
        precision: u32,
    ) -> Self {
        let precision = precision.min(MAX_PRECISION);
        Self(format!(
            "{discriminator}:{}:{}",
            format_point(origin, precision),
            format_point(destination, precision)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn format_point(point: Coordinate, precision: u32) -> String {
    format!(
        "{},{}",
        format_component(point.lat, precision),
        format_component(point.lng, precision)
    )
}

fn format_component(value: f64, precision: u32) -> String {
    let scaled = quantize(value, precision);
    let scale = 10i64.pow(precision);
    let sign = if scaled < 0 { "-" } else { "" };
    let abs = scaled.unsigned_abs();
    let scale = scale as u64;

    if precision == 0 {
        format!("{sign}{abs}")
    } else {
        format!(
            "{sign}{}.{:0width$}",
            abs / scale,
            abs % scale,
            width = precision as usize
        )
    }
}

/// Round to an integer count of `10^-precision` units. `-0` collapses to 0.
fn quantize(value: f64, precision: u32) -> i64 {
    (value * 10f64.powi(precision as i32)).round() as i64
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Noise well below half a unit of the last kept decimal never
        /// changes the key.
        #[test]
        fn sub_precision_noise_is_ignored(
            lat in -89_0000i64..89_0000,
            lng in -179_0000i64..179_0000,
            noise_lat in -0.00004f64..0.00004,
            noise_lng in -0.00004f64..0.00004,
        ) {
            let base = Coordinate::new(lat as f64 / 1e4, lng as f64 / 1e4);
            let noisy = Coordinate::new(base.lat + noise_lat, base.lng + noise_lng);
            let dest = Coordinate::new(49.0069, 8.4037);

            prop_assert_eq!(
                CacheKey::new(base, dest, DEFAULT_PRECISION),
                CacheKey::new(noisy, dest, DEFAULT_PRECISION)
            );
        }

        /// The formatted key parses back to the quantized value.
        #[test]
        fn formatted_components_round_trip(value in -180.0f64..180.0) {
            let text = format_component(value, DEFAULT_PRECISION);
            let parsed: f64 = text.parse().unwrap();
            prop_assert_eq!(quantize(parsed, DEFAULT_PRECISION), quantize(value, DEFAULT_PRECISION));
        }
    }
}
