//! Marker specs derived from desired-set entries.

use crate::filter::{DesiredDriver, DesiredRide};
use crate::geo::GeoPoint;
use crate::geolocation::GeolocationFix;
use crate::presence::PresenceState;
use crate::records::RideStatus;

use super::surface::{MarkerIcon, MarkerPopup, MarkerSpec};

const NOT_AVAILABLE: &str = "N/A";

pub fn driver_spec(driver: &DesiredDriver) -> MarkerSpec {
    let record = &driver.record;
    let icon = match driver.presence {
        PresenceState::OnlineBusy => MarkerIcon::DriverBusy,
        _ => MarkerIcon::DriverAvailable,
    };
    let rating = record
        .rating
        .map(|r| format!("{r:.1}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut popup = MarkerPopup::titled(record.name_or_default())
        .line("Status", driver.presence.label())
        .line("Vehicle", record.vehicle.as_deref().unwrap_or(NOT_AVAILABLE))
        .line("Rating", rating);
    if driver.placement.synthesized {
        popup = popup.line("Position", "approximate");
    }

    MarkerSpec {
        position: driver.placement.point,
        icon,
        popup,
    }
}

pub fn ride_spec(ride: &DesiredRide) -> MarkerSpec {
    let record = &ride.record;
    let icon = match record.status {
        RideStatus::InProgress => MarkerIcon::RideInProgress,
        _ => MarkerIcon::RideAccepted,
    };

    let mut popup = MarkerPopup::titled("Active ride")
        .line("From", record.origin_label.as_deref().unwrap_or(NOT_AVAILABLE))
        .line("To", record.destination_label.as_deref().unwrap_or(NOT_AVAILABLE))
        .line("Fare", format!("{:.2}", record.fare))
        .line("Status", ride_status_label(record.status));
    if ride.placement.synthesized {
        popup = popup.line("Position", "approximate");
    }

    MarkerSpec {
        position: ride.placement.point,
        icon,
        popup,
    }
}

pub fn anchor_spec(center: GeoPoint, label: &str) -> MarkerSpec {
    MarkerSpec {
        position: center,
        icon: MarkerIcon::Anchor,
        popup: MarkerPopup::titled(label),
    }
}

pub fn self_location_spec(fix: &GeolocationFix) -> MarkerSpec {
    MarkerSpec {
        position: fix.point,
        icon: MarkerIcon::SelfLocation,
        popup: MarkerPopup::titled("You are here")
            .line("Accuracy", format!("{:.0} m", fix.accuracy_m)),
    }
}

fn ride_status_label(status: RideStatus) -> &'static str {
    match status {
        RideStatus::Pending => "Pending",
        RideStatus::Accepted => "Accepted",
        RideStatus::InProgress => "In progress",
        RideStatus::Completed => "Completed",
        RideStatus::Canceled => "Canceled",
        RideStatus::Unknown => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Placement;
    use crate::records::{DriverRecord, RideRecord};

    fn point() -> GeoPoint {
        GeoPoint::new(-23.55, -46.63).expect("valid point")
    }

    #[test]
    fn driver_popup_falls_back_for_missing_fields() {
        let desired = DesiredDriver {
            record: DriverRecord::new("d1"),
            presence: PresenceState::OnlineBusy,
            placement: Placement {
                point: point(),
                synthesized: true,
            },
        };
        let spec = driver_spec(&desired);
        assert_eq!(spec.icon, MarkerIcon::DriverBusy);
        assert_eq!(spec.popup.title, "Driver");
        assert_eq!(spec.popup.value("Vehicle"), Some("N/A"));
        assert_eq!(spec.popup.value("Rating"), Some("N/A"));
        assert_eq!(spec.popup.value("Status"), Some("On a ride"));
        assert_eq!(spec.popup.value("Position"), Some("approximate"));
    }

    #[test]
    fn ride_icon_follows_status() {
        let mut record = RideRecord::new("r1");
        record.status = RideStatus::InProgress;
        record.fare = 23.5;
        let desired = DesiredRide {
            record,
            placement: Placement {
                point: point(),
                synthesized: false,
            },
        };
        let spec = ride_spec(&desired);
        assert_eq!(spec.icon, MarkerIcon::RideInProgress);
        assert_eq!(spec.popup.value("Fare"), Some("23.50"));
        assert_eq!(spec.popup.value("Position"), None);
    }
}
