//! Geographic primitives: validated coordinates and great-circle distance.
//!
//! Coordinates are opaque numeric pairs everywhere in the engine. The only
//! geometry performed is the haversine distance, used to size and compare the
//! precision circle drawn around a self-location fix.

use h3o::LatLng;
use serde::{Deserialize, Serialize};

/// Mean Earth radius (km) used by [distance_km].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two points given in degrees.
///
/// Haversine formula; the result is non-negative for any finite input.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lng1) = (lat1.to_radians(), lng1.to_radians());
    let (lat2, lng2) = (lat2.to_radians(), lng2.to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlng = (dlng * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// A finite, in-range WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Returns `None` for non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        LatLng::new(lat, lng).ok()?;
        Some(Self { lat, lng })
    }

    /// For compile-time constants known to be in range.
    pub(crate) const fn from_degrees(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point only when both halves are present and valid.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        Self::new(lat?, lng?)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }

    /// Shifts the point by the given degrees, clamping to the valid range.
    pub fn offset(&self, dlat: f64, dlng: f64) -> GeoPoint {
        let lat = (self.lat + finite_or_zero(dlat)).clamp(-90.0, 90.0);
        let lng = (self.lng + finite_or_zero(dlng)).clamp(-180.0, 180.0);
        GeoPoint { lat, lng }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl TryFrom<GeoPoint> for LatLng {
    type Error = h3o::error::InvalidLatLng;

    fn try_from(point: GeoPoint) -> Result<Self, Self::Error> {
        LatLng::new(point.lat, point.lng)
    }
}

impl From<LatLng> for GeoPoint {
    fn from(value: LatLng) -> Self {
        GeoPoint {
            lat: value.lat(),
            lng: value.lng(),
        }
    }
}

/// Precision circle drawn around a self-location fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyCircle {
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl AccuracyCircle {
    pub fn new(center: GeoPoint, radius_m: f64) -> Self {
        Self {
            center,
            radius_m: radius_m.max(0.0),
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.center.distance_km(point) * 1000.0 <= self.radius_m
    }
}
