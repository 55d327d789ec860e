//! Encoded polyline decoding.
//!
//! Each coordinate is stored as a latitude delta followed by a longitude
//! delta from the previous point. A delta is a zig-zag signed integer
//! split into 5-bit chunks, least significant first; every chunk except the
//! last carries the 0x20 continuation bit, and each byte is offset by 63 to
//! land in printable ASCII.

use crate::domain::Coordinate;

/// Scale exponent of the standard encoding (1e-5 degrees).
pub const DEFAULT_PRECISION: u32 = 5;

/// Error returned for malformed polyline input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolylineError {
    /// A byte outside the encoding alphabet (`?` through `~`).
    #[error("invalid polyline byte {byte:#04x} at offset {offset}")]
    InvalidByte { offset: usize, byte: u8 },

    /// Input ended inside a value or between latitude and longitude.
    #[error("polyline truncated at offset {offset}")]
    Truncated { offset: usize },

    /// A value, or the running coordinate it is added to, does not fit in
    /// 64 bits.
    #[error("polyline value overflows at offset {offset}")]
    Overflow { offset: usize },
}

/// Decode a polyline at the standard 1e-5 precision.
///
/// # Examples
///
/// ```
/// use route_server::providers::polyline;
///
/// let points = polyline::decode("_p~iF~ps|U").unwrap();
/// assert_eq!(points.len(), 1);
/// assert!((points[0].lat - 38.5).abs() < 1e-9);
/// assert!((points[0].lng + 120.2).abs() < 1e-9);
///
/// assert!(polyline::decode("").unwrap().is_empty());
/// ```
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    decode_with_precision(encoded, DEFAULT_PRECISION)
}

/// Decode a polyline whose values are scaled by `10^precision`.
pub fn decode_with_precision(
    encoded: &str,
    precision: u32,
) -> Result<Vec<Coordinate>, PolylineError> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();

    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        lng = accumulate(lng, bytes, &mut index)?;
        points.push(Coordinate::new(lat as f64 / factor, lng as f64 / factor));
    }

    Ok(points)
}

/// Read the next delta and add it to `total`.
fn accumulate(total: i64, bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let offset = *index;
    total
        .checked_add(next_value(bytes, index)?)
        .ok_or(PolylineError::Overflow { offset })
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let offset = *index;
        let byte = *bytes.get(offset).ok_or(PolylineError::Truncated { offset })?;
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidByte { offset, byte });
        }
        if shift > 60 {
            return Err(PolylineError::Overflow { offset });
        }

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        *index += 1;

        if chunk < 0x20 {
            break;
        }
    }

    // Zig-zag: the low bit carries the sign.
    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Coordinate, lat: f64, lng: f64) {
        assert!(
            (actual.lat - lat).abs() < 1e-9 && (actual.lng - lng).abs() < 1e-9,
            "expected ({lat}, {lng}), got {actual:?}"
        );
    }

    #[test]
    fn decodes_reference_polyline() {
        let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();

        assert_eq!(points.len(), 3);
        assert_close(points[0], 38.5, -120.2);
        assert_close(points[1], 40.7, -120.95);
        assert_close(points[2], 43.252, -126.453);
    }

    #[test]
    fn empty_string_is_empty_geometry() {
        assert_eq!(decode("").unwrap(), Vec::new());
    }

    #[test]
    fn decodes_with_six_digit_precision() {
        // Same deltas read at 1e-6 scale are a tenth of the 1e-5 values.
        let points = decode_with_precision("_p~iF~ps|U", 6).unwrap();
        assert_close(points[0], 3.85, -12.02);
    }

    #[test]
    fn missing_longitude_is_truncated() {
        let err = decode("_p~iF").unwrap_err();
        assert_eq!(err, PolylineError::Truncated { offset: 5 });
    }

    #[test]
    fn unterminated_value_is_truncated() {
        // '_' carries the continuation bit and nothing follows.
        let err = decode("_").unwrap_err();
        assert_eq!(err, PolylineError::Truncated { offset: 1 });
    }

    #[test]
    fn rejects_bytes_outside_alphabet() {
        let err = decode("_p~iF ps|U").unwrap_err();
        assert_eq!(err, PolylineError::InvalidByte { offset: 5, byte: b' ' });
    }

    #[test]
    fn rejects_overlong_values() {
        let err = decode(&"~".repeat(20)).unwrap_err();
        assert!(matches!(err, PolylineError::Overflow { .. }));
    }

    /// Encode one signed delta the way a backend would.
    fn encode_value(value: i64, out: &mut String) {
        let mut rest = ((value << 1) ^ (value >> 63)) as u64;
        while rest >= 0x20 {
            out.push(char::from(((rest & 0x1f) as u8 | 0x20) + 63));
            rest >>= 5;
        }
        out.push(char::from(rest as u8 + 63));
    }

    #[test]
    fn huge_deltas_that_overflow_the_sum_are_rejected() {
        let mut encoded = String::new();
        for _ in 0..3 {
            encode_value(4_000_000_000_000_000_000, &mut encoded);
            encode_value(0, &mut encoded);
        }
        assert_eq!(encoded.len(), 42);

        let err = decode(&encoded).unwrap_err();
        assert_eq!(err, PolylineError::Overflow { offset: 28 });
    }

    #[test]
    fn encoder_helper_matches_reference() {
        let mut encoded = String::new();
        for value in [3_850_000, -12_020_000, 220_000, -75_000, 255_200, -550_300] {
            encode_value(value, &mut encoded);
        }
        assert_eq!(encoded, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }
}
