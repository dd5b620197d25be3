use std::collections::{HashMap, HashSet};
use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FocusError, SurfaceError};
use crate::filter::DesiredSet;
use crate::geo::GeoPoint;
use crate::geolocation::GeolocationFix;
use crate::records::EntityKind;

use super::popup::{anchor_spec, driver_spec, ride_spec, self_location_spec};
use super::surface::{MapSurface, MarkerIcon, MarkerPopup, MarkerSpec, SurfaceId};

/// Fixes closer than this to the previous one (with the same accuracy) do not redraw.
const SELF_LOCATION_MIN_MOVE_M: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Driver,
    Ride,
    SelfLocation,
}

impl MarkerKind {
    pub fn for_entity(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Drivers => Some(MarkerKind::Driver),
            EntityKind::Rides => Some(MarkerKind::Ride),
            EntityKind::Passengers => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerKey {
    pub kind: MarkerKind,
    pub id: String,
}

impl MarkerKey {
    pub fn driver(id: impl Into<String>) -> Self {
        Self {
            kind: MarkerKind::Driver,
            id: id.into(),
        }
    }

    pub fn ride(id: impl Into<String>) -> Self {
        Self {
            kind: MarkerKind::Ride,
            id: id.into(),
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.id)
    }
}

/// One rendered marker and the values it was last drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerHandle {
    key: MarkerKey,
    surface_id: SurfaceId,
    position: GeoPoint,
    icon: MarkerIcon,
    popup: MarkerPopup,
}

impl MarkerHandle {
    fn new(key: MarkerKey, surface_id: SurfaceId, spec: MarkerSpec) -> Self {
        Self {
            key,
            surface_id,
            position: spec.position,
            icon: spec.icon,
            popup: spec.popup,
        }
    }

    pub fn key(&self) -> &MarkerKey {
        &self.key
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn position(&self) -> GeoPoint {
        self.position
    }

    pub fn icon(&self) -> MarkerIcon {
        self.icon
    }

    pub fn popup(&self) -> &MarkerPopup {
        &self.popup
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceOperation {
    Create,
    Move,
    Restyle,
    Remove,
    Circle,
    Focus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerFailure {
    pub key: MarkerKey,
    pub operation: SurfaceOperation,
    pub message: String,
}

/// Operation counts for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failures: Vec<MarkerFailure>,
}

impl ReconcileReport {
    /// Surface mutations issued successfully.
    pub fn operations(&self) -> usize {
        self.created + self.updated + self.removed
    }

    pub fn is_noop(&self) -> bool {
        self.operations() == 0 && self.failures.is_empty()
    }
}

/// The two on-screen counters driven by desired-set sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarkerCounters {
    pub drivers_online: usize,
    pub active_rides: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfLocationOutcome {
    Placed,
    Replaced,
    /// Same spot as before; only the view was re-centred.
    Refocused,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SelfLocationMarker {
    marker: SurfaceId,
    circle: SurfaceId,
    fix: GeolocationFix,
}

/// Owns every marker on the map surface. Entity markers are diffed against
/// each desired set; the anchor and the self-location marker are managed
/// separately and never take part in a diff.
#[derive(Debug, Resource)]
pub struct MarkerReconciler {
    surface: Box<dyn MapSurface>,
    rendered: HashMap<MarkerKey, MarkerHandle>,
    anchor: Option<SurfaceId>,
    self_location: Option<SelfLocationMarker>,
    counters: MarkerCounters,
}

impl MarkerReconciler {
    pub fn new(surface: Box<dyn MapSurface>) -> Self {
        Self {
            surface,
            rendered: HashMap::new(),
            anchor: None,
            self_location: None,
            counters: MarkerCounters::default(),
        }
    }

    /// Brings the rendered markers in line with `desired` using the fewest
    /// surface operations. Failures are recorded per marker and never abort the pass.
    pub fn reconcile(&mut self, desired: &DesiredSet) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let wanted: Vec<(MarkerKey, MarkerSpec)> = desired
            .drivers
            .iter()
            .map(|d| (MarkerKey::driver(d.record.id.as_str()), driver_spec(d)))
            .chain(
                desired
                    .rides
                    .iter()
                    .map(|r| (MarkerKey::ride(r.record.id.as_str()), ride_spec(r))),
            )
            .collect();
        let wanted_keys: HashSet<&MarkerKey> = wanted.iter().map(|(key, _)| key).collect();

        let mut stale: Vec<MarkerKey> = self
            .rendered
            .keys()
            .filter(|key| !wanted_keys.contains(key))
            .cloned()
            .collect();
        stale.sort();
        for key in stale {
            let Some(handle) = self.rendered.remove(&key) else {
                continue;
            };
            match self.surface.remove_marker(handle.surface_id) {
                Ok(()) => {
                    debug!(marker = %key, "marker removed");
                    report.removed += 1;
                }
                Err(err) => record_failure(&mut report, key, SurfaceOperation::Remove, err),
            }
        }

        let mut seen: HashSet<&MarkerKey> = HashSet::with_capacity(wanted.len());
        for (key, spec) in &wanted {
            if !seen.insert(key) {
                continue;
            }
            match self.rendered.get(key) {
                None => self.create(key, spec, &mut report),
                Some(handle) => {
                    let moved = handle.position != spec.position;
                    let restyled = handle.icon != spec.icon || handle.popup != spec.popup;
                    if moved || restyled {
                        self.update(key, spec, moved, restyled, &mut report);
                    } else {
                        report.unchanged += 1;
                    }
                }
            }
        }

        if desired.mode.includes_drivers() {
            self.counters.drivers_online = desired.drivers.len();
        }
        if desired.mode.includes_rides() {
            self.counters.active_rides = desired.rides.len();
        }

        report
    }

    fn create(&mut self, key: &MarkerKey, spec: &MarkerSpec, report: &mut ReconcileReport) {
        match self.surface.add_marker(spec) {
            Ok(surface_id) => {
                debug!(marker = %key, %surface_id, "marker created");
                self.rendered.insert(
                    key.clone(),
                    MarkerHandle::new(key.clone(), surface_id, spec.clone()),
                );
                report.created += 1;
            }
            Err(err) => record_failure(report, key.clone(), SurfaceOperation::Create, err),
        }
    }

    fn update(
        &mut self,
        key: &MarkerKey,
        spec: &MarkerSpec,
        moved: bool,
        restyled: bool,
        report: &mut ReconcileReport,
    ) {
        let Some(handle) = self.rendered.get_mut(key) else {
            return;
        };
        let surface_id = handle.surface_id;

        let mut result = Ok(());
        if moved {
            result = self
                .surface
                .move_marker(surface_id, spec.position)
                .map_err(|err| (SurfaceOperation::Move, err));
        }
        if restyled && result.is_ok() {
            result = self
                .surface
                .restyle_marker(surface_id, spec)
                .map_err(|err| (SurfaceOperation::Restyle, err));
        }

        match result {
            Ok(()) => {
                handle.position = spec.position;
                handle.icon = spec.icon;
                handle.popup = spec.popup.clone();
                debug!(marker = %key, moved, restyled, "marker updated");
                report.updated += 1;
            }
            Err((operation, err)) => {
                // A marker in an unknown state is dropped; the next pass recreates it.
                self.rendered.remove(key);
                if let Err(cleanup) = self.surface.remove_marker(surface_id) {
                    debug!(marker = %key, error = %cleanup, "cleanup after failed update also failed");
                }
                record_failure(report, key.clone(), operation, err);
            }
        }
    }

    /// Draws the fixed city-centre anchor once. Later calls are no-ops.
    pub fn place_anchor(&mut self, center: GeoPoint, label: &str) -> Result<SurfaceId, SurfaceError> {
        if let Some(id) = self.anchor {
            return Ok(id);
        }
        let id = self.surface.add_marker(&anchor_spec(center, label))?;
        debug!(surface_id = %id, "anchor placed");
        self.anchor = Some(id);
        Ok(id)
    }

    /// Shows `fix` as the self-location marker with its accuracy circle,
    /// replacing any previous marker and circle, then focuses the view.
    pub fn place_self_location(
        &mut self,
        fix: GeolocationFix,
        zoom: u8,
    ) -> Result<SelfLocationOutcome, SurfaceError> {
        let previous = self.self_location;
        let outcome = match previous {
            Some(previous)
                if previous.fix.accuracy_m == fix.accuracy_m
                    && previous.fix.point.distance_km(&fix.point) * 1000.0
                        < SELF_LOCATION_MIN_MOVE_M =>
            {
                SelfLocationOutcome::Refocused
            }
            Some(_) => {
                self.clear_self_location();
                self.draw_self_location(fix)?;
                SelfLocationOutcome::Replaced
            }
            None => {
                self.draw_self_location(fix)?;
                SelfLocationOutcome::Placed
            }
        };

        let popup_of = self.self_location.map(|s| s.marker);
        if let Err(err) = self.surface.focus(fix.point, zoom, popup_of) {
            warn!(error = %err, "failed to focus on self-location");
        }
        Ok(outcome)
    }

    fn draw_self_location(&mut self, fix: GeolocationFix) -> Result<(), SurfaceError> {
        let marker = self.surface.add_marker(&self_location_spec(&fix))?;
        let accuracy = fix.accuracy_circle();
        let circle = match self.surface.add_circle(accuracy.center, accuracy.radius_m) {
            Ok(circle) => circle,
            Err(err) => {
                if let Err(cleanup) = self.surface.remove_marker(marker) {
                    debug!(error = %cleanup, "failed to remove orphaned self-location marker");
                }
                return Err(err);
            }
        };
        self.self_location = Some(SelfLocationMarker {
            marker,
            circle,
            fix,
        });
        Ok(())
    }

    fn clear_self_location(&mut self) -> usize {
        let Some(previous) = self.self_location.take() else {
            return 0;
        };
        let mut removed = 0;
        for id in [previous.marker, previous.circle] {
            match self.surface.remove_marker(id) {
                Ok(()) => removed += 1,
                Err(err) => warn!(surface_id = %id, error = %err, "failed to remove self-location object"),
            }
        }
        removed
    }

    /// Focuses the marker for `(kind, id)` and opens its popup.
    pub fn center_on(&mut self, kind: EntityKind, id: &str, zoom: u8) -> Result<GeoPoint, FocusError> {
        let marker_kind = MarkerKind::for_entity(kind).ok_or(FocusError::NotMappable(kind))?;
        let key = MarkerKey {
            kind: marker_kind,
            id: id.to_string(),
        };
        let handle = self.rendered.get(&key).ok_or_else(|| FocusError::NotRendered {
            kind,
            id: id.to_string(),
        })?;
        let position = handle.position;
        self.surface.focus(position, zoom, Some(handle.surface_id))?;
        Ok(position)
    }

    /// Removes every object this reconciler ever drew. Returns how many were removed.
    pub fn teardown(&mut self) -> usize {
        let mut keys: Vec<MarkerKey> = self.rendered.keys().cloned().collect();
        keys.sort();
        let mut removed = 0;
        for key in keys {
            if let Some(handle) = self.rendered.remove(&key) {
                match self.surface.remove_marker(handle.surface_id) {
                    Ok(()) => removed += 1,
                    Err(err) => warn!(marker = %key, error = %err, "failed to remove marker on teardown"),
                }
            }
        }
        removed += self.clear_self_location();
        if let Some(anchor) = self.anchor.take() {
            match self.surface.remove_marker(anchor) {
                Ok(()) => removed += 1,
                Err(err) => warn!(error = %err, "failed to remove anchor on teardown"),
            }
        }
        self.counters = MarkerCounters::default();
        removed
    }

    pub fn handle(&self, key: &MarkerKey) -> Option<&MarkerHandle> {
        self.rendered.get(key)
    }

    pub fn handles(&self) -> impl Iterator<Item = &MarkerHandle> {
        self.rendered.values()
    }

    pub fn is_rendered(&self, kind: EntityKind, id: &str) -> bool {
        MarkerKind::for_entity(kind)
            .map(|kind| {
                self.rendered.contains_key(&MarkerKey {
                    kind,
                    id: id.to_string(),
                })
            })
            .unwrap_or(false)
    }

    pub fn rendered_len(&self) -> usize {
        self.rendered.len()
    }

    pub fn counters(&self) -> MarkerCounters {
        self.counters
    }

    pub fn anchor(&self) -> Option<SurfaceId> {
        self.anchor
    }

    pub fn self_location(&self) -> Option<GeolocationFix> {
        self.self_location.map(|s| s.fix)
    }
}

fn record_failure(
    report: &mut ReconcileReport,
    key: MarkerKey,
    operation: SurfaceOperation,
    err: SurfaceError,
) {
    warn!(marker = %key, ?operation, error = %err, "map surface operation failed");
    report.failures.push(MarkerFailure {
        key,
        operation,
        message: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DesiredDriver, DesiredRide, DisplayMode, Placement};
    use crate::presence::PresenceState;
    use crate::records::{DriverRecord, RideRecord, RideStatus};
    use crate::test_helpers::{RecordingSurface, SurfaceOp};

    fn at(lat: f64, lng: f64) -> Placement {
        Placement {
            point: GeoPoint::new(lat, lng).expect("valid point"),
            synthesized: false,
        }
    }

    fn driver(id: &str, presence: PresenceState, lat: f64) -> DesiredDriver {
        DesiredDriver {
            record: DriverRecord::new(id),
            presence,
            placement: at(lat, -46.63),
        }
    }

    fn ride(id: &str, status: RideStatus) -> DesiredRide {
        let mut record = RideRecord::new(id);
        record.status = status;
        DesiredRide {
            record,
            placement: at(-23.54, -46.62),
        }
    }

    fn desired(drivers: Vec<DesiredDriver>, rides: Vec<DesiredRide>) -> DesiredSet {
        DesiredSet {
            mode: DisplayMode::All,
            drivers,
            rides,
            evaluated_at_ms: 0,
        }
    }

    fn reconciler() -> (MarkerReconciler, crate::test_helpers::SurfaceJournal) {
        let surface = RecordingSurface::new();
        let journal = surface.journal();
        (MarkerReconciler::new(Box::new(surface)), journal)
    }

    #[test]
    fn second_pass_with_same_input_is_a_noop() {
        let (mut reconciler, journal) = reconciler();
        let set = desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            vec![ride("r1", RideStatus::Accepted)],
        );

        let first = reconciler.reconcile(&set);
        assert_eq!(first.created, 2);
        journal.clear_ops();

        let second = reconciler.reconcile(&set);
        assert!(second.is_noop());
        assert_eq!(second.unchanged, 2);
        assert!(journal.ops().is_empty());
    }

    #[test]
    fn dropping_one_id_issues_exactly_one_remove() {
        let (mut reconciler, journal) = reconciler();
        reconciler.reconcile(&desired(
            vec![
                driver("d1", PresenceState::OnlineAvailable, -23.55),
                driver("d2", PresenceState::OnlineAvailable, -23.56),
            ],
            Vec::new(),
        ));
        journal.clear_ops();

        let report = reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            Vec::new(),
        ));
        assert_eq!(report.removed, 1);
        assert_eq!(report.operations(), 1);
        assert_eq!(journal.ops().len(), 1);
        assert!(matches!(journal.ops()[0], SurfaceOp::Remove(_)));
        assert!(!reconciler.is_rendered(EntityKind::Drivers, "d2"));
    }

    #[test]
    fn presence_change_restyles_in_place_and_move_only_moves() {
        let (mut reconciler, journal) = reconciler();
        reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            Vec::new(),
        ));
        let original = reconciler
            .handle(&MarkerKey::driver("d1"))
            .map(|h| h.surface_id())
            .expect("rendered");
        journal.clear_ops();

        let report = reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineBusy, -23.55)],
            Vec::new(),
        ));
        assert_eq!(report.updated, 1);
        assert_eq!(journal.ops(), vec![SurfaceOp::Restyle(original)]);
        journal.clear_ops();

        reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineBusy, -23.57)],
            Vec::new(),
        ));
        assert!(matches!(journal.ops().as_slice(), [SurfaceOp::Move(id, _)] if *id == original));
        let handle = reconciler.handle(&MarkerKey::driver("d1")).expect("rendered");
        assert_eq!(handle.icon(), MarkerIcon::DriverBusy);
        assert_eq!(handle.position().lat(), -23.57);
    }

    #[test]
    fn same_id_in_both_kinds_gets_two_markers() {
        let (mut reconciler, _journal) = reconciler();
        reconciler.reconcile(&desired(
            vec![driver("x", PresenceState::OnlineAvailable, -23.55)],
            vec![ride("x", RideStatus::InProgress)],
        ));
        assert_eq!(reconciler.rendered_len(), 2);
    }

    #[test]
    fn duplicate_entries_never_create_two_handles() {
        let (mut reconciler, journal) = reconciler();
        let report = reconciler.reconcile(&desired(
            vec![
                driver("d1", PresenceState::OnlineAvailable, -23.55),
                driver("d1", PresenceState::OnlineAvailable, -23.55),
            ],
            Vec::new(),
        ));
        assert_eq!(report.created, 1);
        assert_eq!(reconciler.rendered_len(), 1);
        assert_eq!(journal.live_markers(), 1);
    }

    #[test]
    fn failed_create_is_isolated_and_retried_next_pass() {
        let (mut reconciler, journal) = reconciler();
        journal.fail_next(SurfaceOperation::Create);

        let set = desired(
            vec![
                driver("d1", PresenceState::OnlineAvailable, -23.55),
                driver("d2", PresenceState::OnlineAvailable, -23.56),
            ],
            Vec::new(),
        );
        let report = reconciler.reconcile(&set);
        assert_eq!(report.created, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].key, MarkerKey::driver("d1"));
        assert!(!reconciler.is_rendered(EntityKind::Drivers, "d1"));

        let retry = reconciler.reconcile(&set);
        assert_eq!(retry.created, 1);
        assert!(reconciler.is_rendered(EntityKind::Drivers, "d1"));
    }

    #[test]
    fn failed_remove_still_drops_the_handle() {
        let (mut reconciler, journal) = reconciler();
        reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            Vec::new(),
        ));
        journal.fail_next(SurfaceOperation::Remove);

        let report = reconciler.reconcile(&desired(Vec::new(), Vec::new()));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(reconciler.rendered_len(), 0);
    }

    #[test]
    fn failed_move_drops_handle_so_next_pass_recreates() {
        let (mut reconciler, journal) = reconciler();
        reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            Vec::new(),
        ));
        journal.fail_next(SurfaceOperation::Move);

        let moved = desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.58)],
            Vec::new(),
        );
        let report = reconciler.reconcile(&moved);
        assert_eq!(report.failures[0].operation, SurfaceOperation::Move);
        assert_eq!(reconciler.rendered_len(), 0);
        assert_eq!(journal.live_markers(), 0);

        assert_eq!(reconciler.reconcile(&moved).created, 1);
    }

    #[test]
    fn counters_follow_the_mode() {
        let (mut reconciler, _journal) = reconciler();
        reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            vec![ride("r1", RideStatus::Accepted), ride("r2", RideStatus::InProgress)],
        ));
        assert_eq!(
            reconciler.counters(),
            MarkerCounters {
                drivers_online: 1,
                active_rides: 2
            }
        );

        let mut rides_only = desired(Vec::new(), vec![ride("r1", RideStatus::Accepted)]);
        rides_only.mode = DisplayMode::Rides;
        reconciler.reconcile(&rides_only);
        assert_eq!(reconciler.counters().drivers_online, 1);
        assert_eq!(reconciler.counters().active_rides, 1);
    }

    #[test]
    fn anchor_is_placed_once_and_survives_reconciliation() {
        let (mut reconciler, journal) = reconciler();
        let center = GeoPoint::new(-23.5505, -46.6333).expect("valid point");
        let first = reconciler.place_anchor(center, "Operations center").expect("anchor");
        let second = reconciler.place_anchor(center, "Operations center").expect("anchor");
        assert_eq!(first, second);

        reconciler.reconcile(&desired(Vec::new(), Vec::new()));
        assert_eq!(journal.live_markers(), 1);
        assert_eq!(reconciler.rendered_len(), 0);
    }

    #[test]
    fn new_self_location_fix_replaces_marker_and_circle() {
        let (mut reconciler, journal) = reconciler();
        let first = GeolocationFix::new(-23.55, -46.63, 30.0).expect("fix");
        let second = GeolocationFix::new(-23.56, -46.64, 12.0).expect("fix");

        assert_eq!(
            reconciler.place_self_location(first, 15),
            Ok(SelfLocationOutcome::Placed)
        );
        assert_eq!(journal.live_markers(), 1);
        assert_eq!(journal.live_circles(), 1);

        assert_eq!(
            reconciler.place_self_location(second, 15),
            Ok(SelfLocationOutcome::Replaced)
        );
        assert_eq!(journal.live_markers(), 1);
        assert_eq!(journal.live_circles(), 1);

        assert_eq!(
            reconciler.place_self_location(second, 15),
            Ok(SelfLocationOutcome::Refocused)
        );
        assert_eq!(reconciler.self_location(), Some(second));
    }

    #[test]
    fn self_location_circle_follows_fix_accuracy() {
        let (mut reconciler, journal) = reconciler();
        let fix = GeolocationFix::new(-23.55, -46.63, 25.0).expect("fix");
        reconciler.place_self_location(fix, 15).expect("placed");
        assert_eq!(journal.circles(), vec![fix.accuracy_circle()]);
        assert_eq!(journal.count(|op| matches!(op, SurfaceOp::Circle(_, r) if *r == 25.0)), 1);

        let sloppy = GeolocationFix::new(-23.60, -46.70, -5.0).expect("fix");
        reconciler.place_self_location(sloppy, 15).expect("replaced");
        let circles = journal.circles();
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].radius_m, 0.0);
        assert!(circles[0].contains(&sloppy.point));
    }

    #[test]
    fn center_on_reports_missing_markers() {
        let (mut reconciler, journal) = reconciler();
        reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            Vec::new(),
        ));

        let position = reconciler
            .center_on(EntityKind::Drivers, "d1", 16)
            .expect("rendered driver");
        assert_eq!(position.lat(), -23.55);
        assert!(journal
            .ops()
            .iter()
            .any(|op| matches!(op, SurfaceOp::Focus(_, 16, Some(_)))));

        assert!(matches!(
            reconciler.center_on(EntityKind::Rides, "d1", 16),
            Err(FocusError::NotRendered { .. })
        ));
        assert_eq!(
            reconciler.center_on(EntityKind::Passengers, "p1", 16),
            Err(FocusError::NotMappable(EntityKind::Passengers))
        );
    }

    #[test]
    fn teardown_removes_everything() {
        let (mut reconciler, journal) = reconciler();
        let center = GeoPoint::new(-23.5505, -46.6333).expect("valid point");
        reconciler.place_anchor(center, "Operations center").expect("anchor");
        reconciler
            .place_self_location(GeolocationFix::new(-23.55, -46.63, 10.0).expect("fix"), 15)
            .expect("self location");
        reconciler.reconcile(&desired(
            vec![driver("d1", PresenceState::OnlineAvailable, -23.55)],
            vec![ride("r1", RideStatus::Accepted)],
        ));

        assert_eq!(reconciler.teardown(), 5);
        assert_eq!(journal.live_markers(), 0);
        assert_eq!(journal.live_circles(), 0);
        assert_eq!(reconciler.anchor(), None);
    }
}
