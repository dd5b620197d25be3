#![allow(dead_code)]

use fleet_core::geo::GeoPoint;
use fleet_core::records::{DriverRecord, DriverStatus, RideRecord, RideStatus};
use fleet_core::test_helpers::{test_center, test_time};

/// A point a few hundred metres from the test center, for records with real coordinates.
pub fn nearby(dlat: f64, dlng: f64) -> GeoPoint {
    test_center().offset(dlat, dlng)
}

/// Builder for driver fixtures. Defaults to an online, available driver
/// whose heartbeat is `test_time()`.
#[derive(Clone, Debug)]
pub struct DriverBuilder {
    record: DriverRecord,
}

impl DriverBuilder {
    pub fn new(id: &str) -> Self {
        let mut record = DriverRecord::new(id);
        record.status = DriverStatus::Online;
        record.last_heartbeat_at = Some(test_time());
        Self { record }
    }

    pub fn with_status(mut self, status: DriverStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn with_heartbeat(mut self, at_ms: Option<u64>) -> Self {
        self.record.last_heartbeat_at = at_ms;
        self
    }

    pub fn with_last_update(mut self, at_ms: Option<u64>) -> Self {
        self.record.last_update_at = at_ms;
        self
    }

    pub fn in_ride(mut self) -> Self {
        self.record.in_ride = true;
        self
    }

    pub fn with_position(mut self, point: GeoPoint) -> Self {
        self.record.latitude = Some(point.lat());
        self.record.longitude = Some(point.lng());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.record.display_name = Some(name.to_string());
        self
    }

    pub fn with_vehicle(mut self, vehicle: &str) -> Self {
        self.record.vehicle = Some(vehicle.to_string());
        self
    }

    pub fn build(self) -> DriverRecord {
        self.record
    }
}

/// Builder for ride fixtures. Defaults to an in-progress ride without coordinates.
#[derive(Clone, Debug)]
pub struct RideBuilder {
    record: RideRecord,
}

impl RideBuilder {
    pub fn new(id: &str) -> Self {
        let mut record = RideRecord::new(id);
        record.status = RideStatus::InProgress;
        record.created_at = Some(test_time());
        Self { record }
    }

    pub fn with_status(mut self, status: RideStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn with_origin(mut self, point: GeoPoint) -> Self {
        self.record.origin_latitude = Some(point.lat());
        self.record.origin_longitude = Some(point.lng());
        self
    }

    pub fn with_route(mut self, from: &str, to: &str) -> Self {
        self.record.origin_label = Some(from.to_string());
        self.record.destination_label = Some(to.to_string());
        self
    }

    pub fn with_fare(mut self, fare: f64) -> Self {
        self.record.fare = fare;
        self
    }

    pub fn build(self) -> RideRecord {
        self.record
    }
}
