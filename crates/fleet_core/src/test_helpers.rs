//! Test helpers shared by unit tests, integration tests and benches.
//!
//! [RecordingSurface] is an in-memory [MapSurface] that journals every call.
//! The journal is a cloneable handle, so a test can keep inspecting it after
//! the surface itself has been boxed and handed to the engine.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SurfaceError;
use crate::filter::JitterSource;
use crate::geo::{AccuracyCircle, GeoPoint};
use crate::marker::{MapSurface, MarkerSpec, SurfaceId, SurfaceOperation};
use crate::view::WaitingEstimator;

/// A fixed wall-clock instant (2023-11-14T22:13:20Z) used as "now" in tests.
pub const TEST_NOW_MS: u64 = 1_700_000_000_000;

pub fn test_time() -> u64 {
    TEST_NOW_MS
}

/// The default city centre as a point.
pub fn test_center() -> GeoPoint {
    GeoPoint::new(-23.5505, -46.6333).expect("test center should be valid")
}

/// One call made against a [RecordingSurface].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Add(SurfaceId, MarkerSpec),
    Move(SurfaceId, GeoPoint),
    Restyle(SurfaceId),
    Remove(SurfaceId),
    Circle(SurfaceId, f64),
    Focus(GeoPoint, u8, Option<SurfaceId>),
}

#[derive(Debug, Default)]
struct JournalState {
    next_id: u64,
    markers: BTreeMap<SurfaceId, MarkerSpec>,
    circles: BTreeMap<SurfaceId, AccuracyCircle>,
    ops: Vec<SurfaceOp>,
    fail_next: HashMap<SurfaceOperation, usize>,
    unavailable: bool,
}

/// Shared view of what a [RecordingSurface] has drawn. Successful calls are
/// recorded in [SurfaceJournal::ops]; rejected calls are not.
#[derive(Debug, Clone, Default)]
pub struct SurfaceJournal {
    state: Arc<Mutex<JournalState>>,
}

impl SurfaceJournal {
    fn lock(&self) -> MutexGuard<'_, JournalState> {
        self.state.lock().expect("surface journal lock poisoned")
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.lock().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    /// Markers currently on the surface (circles excluded).
    pub fn live_markers(&self) -> usize {
        self.lock().markers.len()
    }

    pub fn live_circles(&self) -> usize {
        self.lock().circles.len()
    }

    pub fn circles(&self) -> Vec<AccuracyCircle> {
        self.lock().circles.values().copied().collect()
    }

    pub fn marker(&self, id: SurfaceId) -> Option<MarkerSpec> {
        self.lock().markers.get(&id).cloned()
    }

    pub fn markers(&self) -> Vec<MarkerSpec> {
        self.lock().markers.values().cloned().collect()
    }

    /// Makes the next call of `operation` fail once.
    pub fn fail_next(&self, operation: SurfaceOperation) {
        *self.lock().fail_next.entry(operation).or_insert(0) += 1;
    }

    /// Makes every call fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn count(&self, predicate: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.lock().ops.iter().filter(|op| predicate(op)).count()
    }
}

impl JournalState {
    fn check(&mut self, operation: SurfaceOperation) -> Result<(), SurfaceError> {
        if self.unavailable {
            return Err(SurfaceError::Unavailable);
        }
        if let Some(remaining) = self.fail_next.get_mut(&operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SurfaceError::Rejected(format!("injected {operation:?} failure")));
            }
        }
        Ok(())
    }

    fn allocate(&mut self) -> SurfaceId {
        self.next_id += 1;
        SurfaceId(self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    journal: SurfaceJournal,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> SurfaceJournal {
        self.journal.clone()
    }
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<SurfaceId, SurfaceError> {
        let mut state = self.journal.lock();
        state.check(SurfaceOperation::Create)?;
        let id = state.allocate();
        state.markers.insert(id, spec.clone());
        state.ops.push(SurfaceOp::Add(id, spec.clone()));
        Ok(id)
    }

    fn move_marker(&mut self, id: SurfaceId, position: GeoPoint) -> Result<(), SurfaceError> {
        let mut state = self.journal.lock();
        state.check(SurfaceOperation::Move)?;
        let marker = state
            .markers
            .get_mut(&id)
            .ok_or(SurfaceError::UnknownObject(id.0))?;
        marker.position = position;
        state.ops.push(SurfaceOp::Move(id, position));
        Ok(())
    }

    fn restyle_marker(&mut self, id: SurfaceId, spec: &MarkerSpec) -> Result<(), SurfaceError> {
        let mut state = self.journal.lock();
        state.check(SurfaceOperation::Restyle)?;
        let marker = state
            .markers
            .get_mut(&id)
            .ok_or(SurfaceError::UnknownObject(id.0))?;
        marker.icon = spec.icon;
        marker.popup = spec.popup.clone();
        state.ops.push(SurfaceOp::Restyle(id));
        Ok(())
    }

    fn remove_marker(&mut self, id: SurfaceId) -> Result<(), SurfaceError> {
        let mut state = self.journal.lock();
        state.check(SurfaceOperation::Remove)?;
        let existed = state.markers.remove(&id).is_some() || state.circles.remove(&id).is_some();
        if !existed {
            return Err(SurfaceError::UnknownObject(id.0));
        }
        state.ops.push(SurfaceOp::Remove(id));
        Ok(())
    }

    fn add_circle(&mut self, center: GeoPoint, radius_m: f64) -> Result<SurfaceId, SurfaceError> {
        let mut state = self.journal.lock();
        state.check(SurfaceOperation::Circle)?;
        let id = state.allocate();
        state.circles.insert(id, AccuracyCircle::new(center, radius_m));
        state.ops.push(SurfaceOp::Circle(id, radius_m));
        Ok(id)
    }

    fn focus(
        &mut self,
        position: GeoPoint,
        zoom: u8,
        popup_of: Option<SurfaceId>,
    ) -> Result<(), SurfaceError> {
        let mut state = self.journal.lock();
        state.check(SurfaceOperation::Focus)?;
        state.ops.push(SurfaceOp::Focus(position, zoom, popup_of));
        Ok(())
    }
}

/// Always returns the same offset, whatever the radius.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter {
    dlat: f64,
    dlng: f64,
}

impl FixedJitter {
    pub fn new(dlat: f64, dlng: f64) -> Self {
        Self { dlat, dlng }
    }

    pub fn none() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl JitterSource for FixedJitter {
    fn offset(&mut self, _radius_deg: f64) -> (f64, f64) {
        (self.dlat, self.dlng)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedWaitingEstimate(pub u32);

impl WaitingEstimator for FixedWaitingEstimate {
    fn estimate(&mut self) -> u32 {
        self.0
    }
}
