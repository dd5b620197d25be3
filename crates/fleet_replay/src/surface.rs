//! A map surface with no screen: every operation becomes a log line.

use std::collections::BTreeMap;

use fleet_core::error::SurfaceError;
use fleet_core::geo::GeoPoint;
use fleet_core::marker::{MapSurface, MarkerSpec, SurfaceId};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drawn {
    Marker(GeoPoint),
    Circle(GeoPoint, f64),
}

#[derive(Debug, Default)]
pub struct LoggingSurface {
    next_id: u64,
    drawn: BTreeMap<SurfaceId, Drawn>,
}

impl LoggingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> SurfaceId {
        self.next_id += 1;
        SurfaceId(self.next_id)
    }

    fn known(&self, id: SurfaceId) -> Result<(), SurfaceError> {
        if self.drawn.contains_key(&id) {
            Ok(())
        } else {
            Err(SurfaceError::UnknownObject(id.0))
        }
    }
}

impl MapSurface for LoggingSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<SurfaceId, SurfaceError> {
        let id = self.allocate();
        self.drawn.insert(id, Drawn::Marker(spec.position));
        debug!(
            %id,
            icon = ?spec.icon,
            title = %spec.popup.title,
            lat = spec.position.lat(),
            lng = spec.position.lng(),
            "marker added"
        );
        Ok(id)
    }

    fn move_marker(&mut self, id: SurfaceId, position: GeoPoint) -> Result<(), SurfaceError> {
        self.known(id)?;
        self.drawn.insert(id, Drawn::Marker(position));
        debug!(%id, lat = position.lat(), lng = position.lng(), "marker moved");
        Ok(())
    }

    fn restyle_marker(&mut self, id: SurfaceId, spec: &MarkerSpec) -> Result<(), SurfaceError> {
        self.known(id)?;
        debug!(%id, icon = ?spec.icon, title = %spec.popup.title, "marker restyled");
        Ok(())
    }

    fn remove_marker(&mut self, id: SurfaceId) -> Result<(), SurfaceError> {
        self.drawn
            .remove(&id)
            .ok_or(SurfaceError::UnknownObject(id.0))?;
        debug!(%id, "marker removed");
        Ok(())
    }

    fn add_circle(&mut self, center: GeoPoint, radius_m: f64) -> Result<SurfaceId, SurfaceError> {
        let id = self.allocate();
        self.drawn.insert(id, Drawn::Circle(center, radius_m));
        debug!(%id, radius_m, "accuracy circle added");
        Ok(id)
    }

    fn focus(
        &mut self,
        position: GeoPoint,
        zoom: u8,
        popup_of: Option<SurfaceId>,
    ) -> Result<(), SurfaceError> {
        if let Some(id) = popup_of {
            self.known(id)?;
        }
        info!(lat = position.lat(), lng = position.lng(), zoom, popup = ?popup_of, "view focused");
        Ok(())
    }
}
