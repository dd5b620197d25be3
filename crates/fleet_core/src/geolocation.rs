//! Boundary with the geolocation provider. The provider enforces timeout and
//! maximum age itself; the engine only sees a fix or a failure kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::ONE_SEC_MS;
use crate::geo::{AccuracyCircle, GeoPoint};

/// Options handed to the provider with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeolocationRequest {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    /// Cached fixes older than this are not acceptable.
    pub maximum_age_ms: u64,
}

impl Default for GeolocationRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10 * ONE_SEC_MS,
            maximum_age_ms: 60 * ONE_SEC_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeolocationFix {
    pub point: GeoPoint,
    pub accuracy_m: f64,
}

impl GeolocationFix {
    /// `None` when the coordinate is invalid. Negative or non-finite accuracy becomes 0.
    pub fn new(lat: f64, lng: f64, accuracy_m: f64) -> Option<Self> {
        let accuracy_m = if accuracy_m.is_finite() {
            accuracy_m.max(0.0)
        } else {
            0.0
        };
        Some(Self {
            point: GeoPoint::new(lat, lng)?,
            accuracy_m,
        })
    }

    pub fn accuracy_circle(&self) -> AccuracyCircle {
        AccuracyCircle::new(self.point, self.accuracy_m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationFailure {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
}

impl GeolocationFailure {
    /// Message shown to the operator.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationFailure::PermissionDenied => {
                "Location access was denied. Allow location access to see your position."
            }
            GeolocationFailure::PositionUnavailable => "Your location is currently unavailable.",
            GeolocationFailure::Timeout => "Locating you took too long. Please try again.",
            GeolocationFailure::Unsupported => "This device cannot report its location.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let request = GeolocationRequest::default();
        assert!(request.high_accuracy);
        assert_eq!(request.timeout_ms, 10_000);
        assert_eq!(request.maximum_age_ms, 60_000);
    }

    #[test]
    fn fix_sanitizes_accuracy() {
        let fix = GeolocationFix::new(-23.55, -46.63, -3.0).expect("valid fix");
        assert_eq!(fix.accuracy_m, 0.0);
        assert!(GeolocationFix::new(100.0, 0.0, 5.0).is_none());
    }

    #[test]
    fn every_failure_has_a_distinct_message() {
        let kinds = [
            GeolocationFailure::PermissionDenied,
            GeolocationFailure::PositionUnavailable,
            GeolocationFailure::Timeout,
            GeolocationFailure::Unsupported,
        ];
        let mut messages: Vec<&str> = kinds.iter().map(|k| k.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), kinds.len());
    }

    #[test]
    fn failure_kinds_use_provider_codes() {
        let failure: GeolocationFailure =
            serde_json::from_str("\"permission_denied\"").expect("failure kind");
        assert_eq!(failure, GeolocationFailure::PermissionDenied);
    }
}
