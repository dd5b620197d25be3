use std::fmt;

use serde::Serialize;

use crate::error::SurfaceError;
use crate::geo::GeoPoint;

/// Opaque id the map surface assigns to each object it draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerIcon {
    Anchor,
    DriverAvailable,
    DriverBusy,
    RideAccepted,
    RideInProgress,
    SelfLocation,
}

/// Popup content as data: a title plus label/value rows. The UI decides markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkerPopup {
    pub title: String,
    pub lines: Vec<(String, String)>,
}

impl MarkerPopup {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.lines.push((label.into(), value.into()));
        self
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// Everything the surface needs to draw one marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub position: GeoPoint,
    pub icon: MarkerIcon,
    pub popup: MarkerPopup,
}

/// The rendering surface markers live on (a slippy map in the dashboard).
///
/// Any call may fail; the reconciler treats every failure as local to the one
/// object it concerns.
pub trait MapSurface: Send + Sync + fmt::Debug {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<SurfaceId, SurfaceError>;

    fn move_marker(&mut self, id: SurfaceId, position: GeoPoint) -> Result<(), SurfaceError>;

    /// Replaces icon and popup in place.
    fn restyle_marker(&mut self, id: SurfaceId, spec: &MarkerSpec) -> Result<(), SurfaceError>;

    fn remove_marker(&mut self, id: SurfaceId) -> Result<(), SurfaceError>;

    /// Draws a circle of `radius_m` metres. Circles are removed with [MapSurface::remove_marker].
    fn add_circle(&mut self, center: GeoPoint, radius_m: f64) -> Result<SurfaceId, SurfaceError>;

    /// Centres the view at `position`, optionally opening the popup of `popup_of`.
    fn focus(
        &mut self,
        position: GeoPoint,
        zoom: u8,
        popup_of: Option<SurfaceId>,
    ) -> Result<(), SurfaceError>;
}
