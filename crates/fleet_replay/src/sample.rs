//! Demonstration dataset shown when no stream has ever delivered data.

use fleet_core::geo::GeoPoint;
use fleet_core::records::{
    DriverRecord, DriverStatus, PassengerRecord, RideRecord, RideStatus,
};
use fleet_core::snapshot::Snapshot;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;
const MIN_MS: u64 = 60 * 1000;

fn driver(id: &str, name: &str, vehicle: &str, rating: f64) -> DriverRecord {
    let mut d = DriverRecord::new(id);
    d.display_name = Some(name.to_string());
    d.vehicle = Some(vehicle.to_string());
    d.rating = Some(rating);
    d
}

fn ride(id: &str, from: &str, to: &str, status: RideStatus, fare: f64, created_at: u64) -> RideRecord {
    let mut r = RideRecord::new(id);
    r.origin_label = Some(from.to_string());
    r.destination_label = Some(to.to_string());
    r.status = status;
    r.fare = fare;
    r.created_at = Some(created_at);
    r
}

fn passenger(id: &str, name: &str, rides: u32, spent: f64, registered_at: u64) -> PassengerRecord {
    let mut p = PassengerRecord::new(id);
    p.name = Some(name.to_string());
    p.ride_count = rides;
    p.total_spent = spent;
    p.registered_at = Some(registered_at);
    p
}

/// One snapshot per kind, timestamped relative to `now_ms`.
pub fn sample_snapshots(center: GeoPoint, now_ms: u64) -> [Snapshot; 3] {
    let mut available = driver("sample-d1", "Sample driver 1", "Hatchback, silver", 4.8);
    available.status = DriverStatus::Online;
    available.last_heartbeat_at = Some(now_ms);
    let near = center.offset(0.008, -0.006);
    available.latitude = Some(near.lat());
    available.longitude = Some(near.lng());

    let mut busy = driver("sample-d2", "Sample driver 2", "Sedan, white", 4.9);
    busy.status = DriverStatus::Online;
    busy.in_ride = true;
    busy.last_update_at = Some(now_ms.saturating_sub(MIN_MS));

    let mut offline = driver("sample-d3", "Sample driver 3", "Hatchback, blue", 4.6);
    offline.status = DriverStatus::Offline;

    let mut pending = driver("sample-d4", "Sample driver 4", "Compact, red", 0.0);
    pending.status = DriverStatus::Pending;
    pending.rating = None;

    let mut in_progress = ride(
        "sample-r2",
        "Avenida Paulista",
        "Ibirapuera",
        RideStatus::InProgress,
        18.75,
        now_ms.saturating_sub(30 * MIN_MS),
    );
    let origin = center.offset(0.01, 0.01);
    in_progress.origin_latitude = Some(origin.lat());
    in_progress.origin_longitude = Some(origin.lng());

    let mut accepted = ride(
        "sample-r3",
        "Liberdade",
        "Morumbi",
        RideStatus::Accepted,
        32.0,
        now_ms.saturating_sub(10 * MIN_MS),
    );
    let origin = center.offset(-0.01, -0.01);
    accepted.origin_latitude = Some(origin.lat());
    accepted.origin_longitude = Some(origin.lng());

    [
        Snapshot::Drivers(vec![available, busy, offline, pending]),
        Snapshot::Rides(vec![
            ride(
                "sample-r1",
                "Centro",
                "Vila Madalena",
                RideStatus::Completed,
                25.5,
                now_ms.saturating_sub(2 * 60 * MIN_MS),
            ),
            in_progress,
            accepted,
        ]),
        Snapshot::Passengers(vec![
            passenger("sample-p1", "Sample passenger 1", 15, 380.5, now_ms.saturating_sub(60 * DAY_MS)),
            passenger("sample-p2", "Sample passenger 2", 8, 195.25, now_ms.saturating_sub(30 * DAY_MS)),
            passenger("sample-p3", "Sample passenger 3", 22, 567.8, now_ms.saturating_sub(90 * DAY_MS)),
        ]),
    ]
}
