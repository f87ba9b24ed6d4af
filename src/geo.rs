//! Great-circle geometry for proximity features.
//!
//! Distances use the Haversine formula on a spherical Earth (R = 6371 km),
//! which is what the storefront needs for "hawkers near you" ranking —
//! sub-kilometer ellipsoid corrections don't matter at city scale.

use std::f64::consts::PI;
use std::fmt;

const DEG: f64 = PI / 180.0;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude or longitude outside its valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LatitudeOutOfRange(lat) => {
                write!(f, "Latitude {} out of range (-90 to 90)", lat)
            }
            Self::LongitudeOutOfRange(lon) => {
                write!(f, "Longitude {} out of range (-180 to 180)", lon)
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

/// Check that a coordinate pair lies on the globe.
///
/// Rejects NaN as well: a NaN coordinate fails both range checks.
pub fn validate_coords(lat: f64, lon: f64) -> Result<(), CoordinateError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(CoordinateError::LatitudeOutOfRange(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(CoordinateError::LongitudeOutOfRange(lon));
    }
    Ok(())
}

/// Haversine distance in kilometers between two points given in degrees.
///
/// Pure and total: no validation happens here. Inputs outside the valid
/// coordinate ranges produce meaningless values — validate at the boundary
/// (see [`validate_coords`]).
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1) * DEG;
    let d_lon = (lon2 - lon1) * DEG;

    let a = (d_lat / 2.0).sin().powi(2)
        + (lat1 * DEG).cos() * (lat2 * DEG).cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Format a coordinate pair for display: `1.3521°N, 103.8198°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identical_points_zero() {
        assert_eq!(distance_km(1.3521, 103.8198, 1.3521, 103.8198), 0.0);
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(distance_km(-90.0, 0.0, -90.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let ab = distance_km(59.3293, 18.0686, 40.7128, -74.0060);
        let ba = distance_km(40.7128, -74.0060, 59.3293, 18.0686);
        assert_abs_diff_eq!(ab, ba, epsilon = 1e-9);
    }

    #[test]
    fn test_singapore_kuala_lumpur() {
        // Known fixture: ~316 km
        let d = distance_km(1.3521, 103.8198, 3.1390, 101.6869);
        assert!((d - 316.0).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        // 2πR / 360 ≈ 111.195 km
        let d = distance_km(0.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(d, 111.195, epsilon = 0.01);
    }

    #[test]
    fn test_pole_to_pole() {
        let d = distance_km(90.0, 0.0, -90.0, 0.0);
        assert_abs_diff_eq!(d, PI * EARTH_RADIUS_KM, epsilon = 1e-6);
    }

    #[test]
    fn test_antimeridian_neighbors() {
        // 179.9°E to 179.9°W is 0.2° of longitude at the equator, not 359.8°
        let d = distance_km(0.0, 179.9, 0.0, -179.9);
        assert!(d < 25.0, "got {}", d);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(validate_coords(1.3521, 103.8198).is_ok());
        assert!(validate_coords(90.0, 180.0).is_ok());
        assert!(validate_coords(-90.0, -180.0).is_ok());
        assert_eq!(
            validate_coords(90.01, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(90.01))
        );
        assert_eq!(
            validate_coords(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert!(validate_coords(f64::NAN, 0.0).is_err());
        assert!(validate_coords(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_format_coords() {
        assert_eq!(format_coords(1.3521, 103.8198), "1.3521\u{00B0}N, 103.8198\u{00B0}E");
        assert_eq!(format_coords(-33.8688, -70.6693), "33.8688\u{00B0}S, 70.6693\u{00B0}W");
    }
}
