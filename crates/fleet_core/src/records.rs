//! Entity records delivered by the collection streams.
//!
//! Records are replaced wholesale whenever their stream emits a new snapshot;
//! the engine never mutates a record in place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// The three independently streamed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Drivers,
    Rides,
    Passengers,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Drivers, EntityKind::Rides, EntityKind::Passengers];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Drivers => "drivers",
            EntityKind::Rides => "rides",
            EntityKind::Passengers => "passengers",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            EntityKind::Drivers => 0,
            EntityKind::Rides => 1,
            EntityKind::Passengers => 2,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drivers" => Ok(EntityKind::Drivers),
            "rides" => Ok(EntityKind::Rides),
            "passengers" => Ok(EntityKind::Passengers),
            other => Err(format!("unknown entity kind `{other}`")),
        }
    }
}

/// Status flag as written by the driver app. Anything unrecognised is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Online,
    Offline,
    Pending,
    #[default]
    #[serde(other)]
    Other,
}

impl DriverStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "online" => DriverStatus::Online,
            "offline" => DriverStatus::Offline,
            "pending" => DriverStatus::Pending,
            _ => DriverStatus::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DriverStatus::Online => "online",
            DriverStatus::Offline => "offline",
            DriverStatus::Pending => "pending",
            DriverStatus::Other => "other",
        }
    }
}

/// Ride lifecycle flag. Unrecognised values decode to `Unknown` and are never shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    #[default]
    Pending,
    Accepted,
    InProgress,
    Completed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl RideStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => RideStatus::Pending,
            "accepted" => RideStatus::Accepted,
            "in_progress" => RideStatus::InProgress,
            "completed" => RideStatus::Completed,
            "canceled" | "cancelled" => RideStatus::Canceled,
            _ => RideStatus::Unknown,
        }
    }

    /// Rides placed on the map: accepted or in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, RideStatus::Accepted | RideStatus::InProgress)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Canceled => "canceled",
            RideStatus::Unknown => "unknown",
        }
    }
}

/// Anything that lives in one of the streamed collections.
pub trait Record: Clone {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub id: String,
    pub display_name: Option<String>,
    pub vehicle: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: DriverStatus,
    /// 0–5 when known.
    pub rating: Option<f64>,
    /// `None` means "unknown"; the filter pipeline synthesizes a position.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub in_ride: bool,
    /// Epoch milliseconds of the last liveness ping.
    pub last_heartbeat_at: Option<u64>,
    /// Epoch milliseconds of the last document update.
    pub last_update_at: Option<u64>,
}

impl DriverRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            vehicle: None,
            email: None,
            phone: None,
            status: DriverStatus::Other,
            rating: None,
            latitude: None,
            longitude: None,
            in_ride: false,
            last_heartbeat_at: None,
            last_update_at: None,
        }
    }

    pub fn position(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }

    pub fn name_or_default(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Driver")
    }
}

impl Record for DriverRecord {
    const KIND: EntityKind = EntityKind::Drivers;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRecord {
    pub id: String,
    pub origin_label: Option<String>,
    pub destination_label: Option<String>,
    pub passenger_name: Option<String>,
    pub driver_name: Option<String>,
    pub status: RideStatus,
    pub fare: f64,
    pub origin_latitude: Option<f64>,
    pub origin_longitude: Option<f64>,
    pub created_at: Option<u64>,
}

impl RideRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin_label: None,
            destination_label: None,
            passenger_name: None,
            driver_name: None,
            status: RideStatus::Pending,
            fare: 0.0,
            origin_latitude: None,
            origin_longitude: None,
            created_at: None,
        }
    }

    pub fn origin(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.origin_latitude, self.origin_longitude)
    }
}

impl Record for RideRecord {
    const KIND: EntityKind = EntityKind::Rides;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Read-only passthrough; passengers never reach the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub ride_count: u32,
    pub total_spent: f64,
    pub registered_at: Option<u64>,
}

impl PassengerRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            phone: None,
            ride_count: 0,
            total_spent: 0.0,
            registered_at: None,
        }
    }
}

impl Record for PassengerRecord {
    const KIND: EntityKind = EntityKind::Passengers;

    fn id(&self) -> &str {
        &self.id
    }
}
