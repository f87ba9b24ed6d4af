//! Core types for the geolocation subsystem.

use crate::geo::{self, CoordinateError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A normalized geolocation reading.
///
/// Built only through [`Position::new`] or [`Position::from_raw`], so a value
/// of this type always carries in-range coordinates, non-negative accuracy and
/// speed, and a heading reduced into [0, 360). Created fresh on each read; no
/// identity beyond its fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Estimated accuracy radius in meters.
    pub accuracy: f64,
    /// Ground speed in meters per second. 0 when the platform reports none.
    pub speed: f64,
    /// Heading in degrees clockwise from true north. 0 when stationary.
    pub heading: f64,
}

impl Position {
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        speed: f64,
        heading: f64,
    ) -> Result<Self, CoordinateError> {
        geo::validate_coords(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            accuracy: finite_or_zero(accuracy).max(0.0),
            speed: finite_or_zero(speed).max(0.0),
            heading: finite_or_zero(heading).rem_euclid(360.0),
        })
    }

    /// Normalize a raw platform fix. Platforms report null/NaN speed and
    /// heading when stationary; both default to 0.
    pub fn from_raw(fix: RawFix) -> Result<Self, CoordinateError> {
        Self::new(
            fix.latitude,
            fix.longitude,
            fix.accuracy,
            fix.speed.unwrap_or(0.0),
            fix.heading.unwrap_or(0.0),
        )
    }

    /// Great-circle distance to another position in kilometers.
    pub fn distance_km(&self, other: &Position) -> f64 {
        geo::distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// What a platform provider reports before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
}

impl RawFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self { latitude, longitude, accuracy, speed: None, heading: None }
    }
}

/// Options for a platform position request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixOptions {
    /// Prefer a precise (GPS-grade) fix over a fast one.
    pub high_accuracy: bool,
    /// Deadline for the fix. Enforced by the service wrapper even when the
    /// platform stalls.
    pub timeout: Duration,
    /// Oldest cached fix the caller will accept. Zero means a fresh fix only.
    pub maximum_age: Duration,
}

/// Platform permission state for location access.
///
/// The permission query is an optional platform capability; providers that
/// cannot answer report [`PermissionState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    Unknown,
}

/// Lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Created, nothing requested from the platform yet.
    Idle,
    /// Running the permission-confirmation fix.
    PermissionPending,
    /// Platform watch established; updates flow.
    Active,
    /// Terminated. Only explicit cancellation stops an active session.
    Stopped,
}

/// Raw typed failure reported by a platform provider.
///
/// Mirrors the platform error codes (permission denied / position
/// unavailable / timeout) plus a catch-all; each carries the platform's own
/// message, which the service discards for the three typed kinds in favor of
/// uniform user-facing text.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderFault {
    PermissionDenied(String),
    PositionUnavailable(String),
    Timeout(String),
    Other(String),
}

/// Geolocation errors, as surfaced to callers.
///
/// Every platform fault maps into exactly one of these kinds; none is
/// swallowed. All are recoverable by retrying or prompting the user.
#[derive(Debug, Clone)]
pub enum GeoError {
    /// The user or platform has blocked location access.
    PermissionDenied,
    /// The platform cannot determine a fix (no GPS signal, no network).
    PositionUnavailable,
    /// The request expired, including the low-accuracy retry.
    Timeout,
    /// The platform exposes no location capability.
    NotSupported,
    Unknown(String),
}

impl From<ProviderFault> for GeoError {
    fn from(fault: ProviderFault) -> Self {
        match fault {
            ProviderFault::PermissionDenied(_) => Self::PermissionDenied,
            ProviderFault::PositionUnavailable(_) => Self::PositionUnavailable,
            ProviderFault::Timeout(_) => Self::Timeout,
            ProviderFault::Other(msg) => Self::Unknown(msg),
        }
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(
                f,
                "Location access was denied. Enable location services for this app in your device settings and try again."
            ),
            Self::PositionUnavailable => write!(
                f,
                "Your location is currently unavailable. Check that GPS or location services are enabled and try again."
            ),
            Self::Timeout => write!(
                f,
                "Location request timed out. Move to an area with better signal and try again."
            ),
            Self::NotSupported => write!(f, "Location is not supported on this platform"),
            Self::Unknown(msg) => write!(f, "Location error: {}", msg),
        }
    }
}

impl std::error::Error for GeoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_defaults() {
        let p = Position::from_raw(RawFix::new(1.3521, 103.8198, 25.0)).unwrap();
        assert_eq!(p.speed, 0.0);
        assert_eq!(p.heading, 0.0);
        assert_eq!(p.accuracy, 25.0);
    }

    #[test]
    fn test_from_raw_non_finite_motion() {
        // Browsers hand back NaN heading while stationary.
        let fix = RawFix {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 10.0,
            speed: Some(f64::NAN),
            heading: Some(f64::NAN),
        };
        let p = Position::from_raw(fix).unwrap();
        assert_eq!(p.speed, 0.0);
        assert_eq!(p.heading, 0.0);
    }

    #[test]
    fn test_heading_wraps() {
        let p = Position::new(0.0, 0.0, 0.0, 0.0, 450.0).unwrap();
        assert_eq!(p.heading, 90.0);
        let p = Position::new(0.0, 0.0, 0.0, 0.0, -90.0).unwrap();
        assert_eq!(p.heading, 270.0);
    }

    #[test]
    fn test_negative_clamped() {
        let p = Position::new(0.0, 0.0, -5.0, -1.0, 0.0).unwrap();
        assert_eq!(p.accuracy, 0.0);
        assert_eq!(p.speed, 0.0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Position::new(91.0, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(Position::from_raw(RawFix::new(0.0, 181.0, 0.0)).is_err());
    }

    #[test]
    fn test_fault_mapping() {
        assert!(matches!(
            GeoError::from(ProviderFault::PermissionDenied("code 1".into())),
            GeoError::PermissionDenied
        ));
        assert!(matches!(
            GeoError::from(ProviderFault::PositionUnavailable("code 2".into())),
            GeoError::PositionUnavailable
        ));
        assert!(matches!(
            GeoError::from(ProviderFault::Timeout("code 3".into())),
            GeoError::Timeout
        ));
        match GeoError::from(ProviderFault::Other("gps driver crashed".into())) {
            GeoError::Unknown(msg) => assert_eq!(msg, "gps driver crashed"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_position_distance() {
        let sin = Position::new(1.3521, 103.8198, 10.0, 0.0, 0.0).unwrap();
        let kl = Position::new(3.1390, 101.6869, 10.0, 0.0, 0.0).unwrap();
        assert!((sin.distance_km(&kl) - 316.0).abs() < 5.0);
    }
}
