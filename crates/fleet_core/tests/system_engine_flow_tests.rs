mod support;

use fleet_core::error::{FocusError, LocateError, TransportError};
use fleet_core::filter::DisplayMode;
use fleet_core::geolocation::{GeolocationFailure, GeolocationFix};
use fleet_core::marker::{MarkerIcon, SelfLocationOutcome};
use fleet_core::presence::PresenceState;
use fleet_core::records::{EntityKind, PassengerRecord, RideStatus};
use fleet_core::snapshot::Snapshot;
use fleet_core::test_helpers::{test_time, SurfaceOp};
use support::engine::{record_summaries, TestEngineBuilder};
use support::records::{nearby, DriverBuilder, RideBuilder};

#[test]
fn fresh_engine_signals_the_fallback_path() {
    let (engine, journal) = TestEngineBuilder::default().start();
    assert!(engine.is_empty());
    assert!(!engine.has_received_any());
    assert_eq!(journal.live_markers(), 1);
    assert_eq!(
        journal.markers()[0].icon,
        MarkerIcon::Anchor
    );
}

#[test]
fn presence_decays_on_refresh_ticks_without_new_data() {
    let (mut engine, journal) = TestEngineBuilder::default().start();
    engine.ingest(Snapshot::Drivers(vec![DriverBuilder::new("d1").build()]));
    engine.advance_to(test_time());
    assert_eq!(engine.counts().drivers_online, 1);

    let passes_before = engine.passes();
    engine.advance_to(test_time() + 90_000);
    assert_eq!(engine.passes(), passes_before + 1);
    assert_eq!(engine.counts().drivers_online, 1);

    let report = engine.advance_to(test_time() + 120_000).expect("refresh pass");
    assert_eq!(report.removed, 1);
    assert_eq!(engine.counts().drivers_online, 0);
    assert_eq!(engine.presence_of("d1"), Some(PresenceState::Offline));
    assert_eq!(journal.live_markers(), 1);
}

#[test]
fn stream_failure_keeps_the_last_snapshot() {
    let (mut engine, journal) = TestEngineBuilder::default().start();
    engine.ingest(Snapshot::Drivers(vec![DriverBuilder::new("d1").build()]));
    engine.advance_to(test_time());
    journal.clear_ops();

    engine.stream_failed(TransportError::new(EntityKind::Drivers, "unavailable"));
    engine.refresh();
    let report = engine.advance_to(test_time() + 1_000).expect("manual refresh pass");

    assert!(report.is_noop());
    assert!(engine.driver("d1").is_some());
    let status = engine.stream_status(EntityKind::Drivers);
    assert!(status.received);
    assert_eq!(status.consecutive_failures, 1);
    assert_eq!(status.last_error.as_deref(), Some("unavailable"));
    assert!(journal.ops().is_empty());
}

#[test]
fn inputs_between_advances_coalesce_into_one_pass() {
    let (mut engine, _journal) = TestEngineBuilder::default().start();
    let summaries = record_summaries(&mut engine);

    engine.ingest(Snapshot::Drivers(vec![DriverBuilder::new("a").build()]));
    engine.ingest(Snapshot::Drivers(vec![
        DriverBuilder::new("a").build(),
        DriverBuilder::new("b").build(),
    ]));
    engine.ingest(Snapshot::Rides(vec![RideBuilder::new("r1").build()]));
    engine.refresh();
    engine.set_display_mode(DisplayMode::All);

    let report = engine.advance_to(test_time() + 10).expect("one pass");
    assert_eq!(report.created, 3);

    let summaries = summaries.lock().expect("lock");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].counts.drivers_online, 2);
    assert_eq!(summaries[0].counts.active_rides, 1);
    assert_eq!(summaries[0].counts.waiting_passengers_estimate, 3);
}

#[test]
fn switching_to_drivers_mode_clears_ride_markers() {
    let (mut engine, journal) = TestEngineBuilder::default().start();
    engine.ingest(Snapshot::Drivers(vec![DriverBuilder::new("d1").build()]));
    engine.ingest(Snapshot::Rides(vec![RideBuilder::new("r1").build()]));
    engine.advance_to(test_time());
    assert_eq!(journal.live_markers(), 3);

    engine.set_display_mode(DisplayMode::Drivers);
    let report = engine.advance_to(test_time()).expect("mode pass");

    assert_eq!(report.removed, 1);
    assert_eq!(engine.display_mode(), DisplayMode::Drivers);
    assert!(!engine.reconciler().is_rendered(EntityKind::Rides, "r1"));
    assert!(engine.reconciler().is_rendered(EntityKind::Drivers, "d1"));
    assert_eq!(engine.summary().map(|s| s.mode), Some(DisplayMode::Drivers));
}

#[test]
fn summary_reports_totals_and_revenue() {
    let (mut engine, _journal) = TestEngineBuilder::default().start();
    engine.ingest(Snapshot::Drivers(vec![
        DriverBuilder::new("d1").with_name("Ana").build(),
        DriverBuilder::new("d2")
            .with_heartbeat(Some(test_time() - 10 * 60_000))
            .build(),
    ]));
    engine.ingest(Snapshot::Rides(vec![
        RideBuilder::new("r1").with_status(RideStatus::Completed).with_fare(40.0).build(),
        RideBuilder::new("r2").with_status(RideStatus::Completed).with_fare(10.0).build(),
        RideBuilder::new("r3").build(),
    ]));
    engine.ingest(Snapshot::Passengers(vec![PassengerRecord::new("p1")]));
    engine.advance_to(test_time());

    let summary = engine.summary().expect("published");
    assert_eq!(summary.totals.drivers, 2);
    assert_eq!(summary.totals.rides, 3);
    assert_eq!(summary.totals.passengers, 1);
    assert_eq!(summary.revenue.completed_rides, 2);
    assert!((summary.revenue.gross_revenue - 50.0).abs() < 1e-9);
    assert!((summary.revenue.platform_commission - 5.0).abs() < 1e-9);
    assert_eq!(summary.presence.offline, 1);
    assert_eq!(summary.online_preview.len(), 1);
    assert_eq!(summary.online_preview[0].display_name, "Ana");
}

#[test]
fn center_on_reveals_rendered_entities_only() {
    let (mut engine, journal) = TestEngineBuilder::default().start();
    let origin = nearby(0.002, 0.001);
    engine.ingest(Snapshot::Rides(vec![RideBuilder::new("r1").with_origin(origin).build()]));
    engine.ingest(Snapshot::Passengers(vec![PassengerRecord::new("p1")]));
    engine.advance_to(test_time());
    journal.clear_ops();

    assert_eq!(engine.center_on(EntityKind::Rides, "r1"), Ok(origin));
    assert!(matches!(journal.ops().as_slice(), [SurfaceOp::Focus(p, 16, Some(_))] if *p == origin));

    assert_eq!(
        engine.center_on(EntityKind::Passengers, "p1"),
        Err(FocusError::NotMappable(EntityKind::Passengers))
    );
    assert!(matches!(
        engine.center_on(EntityKind::Drivers, "ghost"),
        Err(FocusError::NotRendered { .. })
    ));
}

#[test]
fn geolocation_failure_changes_nothing() {
    let (mut engine, journal) = TestEngineBuilder::default().start();
    journal.clear_ops();

    let result = engine.locate_self(Err(GeolocationFailure::PermissionDenied));
    assert_eq!(
        result,
        Err(LocateError::Geolocation(GeolocationFailure::PermissionDenied))
    );
    assert!(journal.ops().is_empty());
    assert!(engine.reconciler().self_location().is_none());
}

#[test]
fn repeated_fixes_replace_the_self_location_marker() {
    let (mut engine, journal) = TestEngineBuilder::default().start();
    let here = GeolocationFix::new(-23.56, -46.64, 25.0).expect("valid fix");

    assert_eq!(engine.locate_self(Ok(here)), Ok(SelfLocationOutcome::Placed));
    assert_eq!(engine.locate_self(Ok(here)), Ok(SelfLocationOutcome::Refocused));

    let moved = GeolocationFix::new(-23.57, -46.64, 40.0).expect("valid fix");
    assert_eq!(engine.locate_self(Ok(moved)), Ok(SelfLocationOutcome::Replaced));

    assert_eq!(journal.live_circles(), 1);
    assert_eq!(journal.live_markers(), 2);
    assert_eq!(engine.reconciler().self_location(), Some(moved));
}
