//! Filter pipeline: derives the desired display set for the active display mode.
//!
//! Offline drivers never reach the map (they are only counted), and only
//! accepted or in-progress rides are shown. Entities without usable
//! coordinates get a synthetic position jittered around the city centre; the
//! jitter source is pluggable so tests can pin it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::presence::{classify, PresenceState};
use crate::records::{DriverRecord, EntityKind, RideRecord};
use crate::snapshot::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Resource, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    All,
    Drivers,
    Rides,
}

impl DisplayMode {
    pub fn includes_drivers(&self) -> bool {
        matches!(self, DisplayMode::All | DisplayMode::Drivers)
    }

    pub fn includes_rides(&self) -> bool {
        matches!(self, DisplayMode::All | DisplayMode::Rides)
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(DisplayMode::All),
            "drivers" => Ok(DisplayMode::Drivers),
            "rides" => Ok(DisplayMode::Rides),
            other => Err(format!("unknown display mode `{other}`")),
        }
    }
}

/// Source of offsets for synthesized coordinates.
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// Returns `(dlat, dlng)` in degrees, each within `[-radius_deg, radius_deg]`.
    fn offset(&mut self, radius_deg: f64) -> (f64, f64);
}

/// Uniform jitter from a seeded (or entropy-seeded) RNG.
#[derive(Debug)]
pub struct SeededJitter {
    rng: StdRng,
}

impl SeededJitter {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl JitterSource for SeededJitter {
    fn offset(&mut self, radius_deg: f64) -> (f64, f64) {
        if radius_deg <= 0.0 {
            return (0.0, 0.0);
        }
        (
            self.rng.gen_range(-radius_deg..=radius_deg),
            self.rng.gen_range(-radius_deg..=radius_deg),
        )
    }
}

/// Where a marker goes and whether that position is real.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub point: GeoPoint,
    /// True when the record had no usable coordinates.
    pub synthesized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesiredDriver {
    pub record: DriverRecord,
    pub presence: PresenceState,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesiredRide {
    pub record: RideRecord,
    pub placement: Placement,
}

/// What should be on the map right now.
#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct DesiredSet {
    pub mode: DisplayMode,
    pub drivers: Vec<DesiredDriver>,
    pub rides: Vec<DesiredRide>,
    pub evaluated_at_ms: u64,
}

#[derive(Debug, Resource)]
pub struct FilterPipeline {
    center: GeoPoint,
    radius_deg: f64,
    jitter: Box<dyn JitterSource>,
    synthesized: HashMap<(EntityKind, String), GeoPoint>,
}

impl FilterPipeline {
    pub fn new(center: GeoPoint, radius_deg: f64, jitter: Box<dyn JitterSource>) -> Self {
        Self {
            center,
            radius_deg: radius_deg.max(0.0),
            jitter,
            synthesized: HashMap::new(),
        }
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius_deg(&self) -> f64 {
        self.radius_deg
    }

    /// Computes the desired set for `mode` at `now_ms`.
    pub fn select(&mut self, store: &SnapshotStore, mode: DisplayMode, now_ms: u64) -> DesiredSet {
        self.prune(store);

        let mut drivers = Vec::new();
        if mode.includes_drivers() {
            for record in store.drivers() {
                let presence = classify(record, now_ms);
                if !presence.is_online() {
                    continue;
                }
                let placement = self.place(EntityKind::Drivers, &record.id, record.position());
                drivers.push(DesiredDriver {
                    record: record.clone(),
                    presence,
                    placement,
                });
            }
        }

        let mut rides = Vec::new();
        if mode.includes_rides() {
            for record in store.rides() {
                if !record.status.is_active() {
                    continue;
                }
                let placement = self.place(EntityKind::Rides, &record.id, record.origin());
                rides.push(DesiredRide {
                    record: record.clone(),
                    placement,
                });
            }
        }

        DesiredSet {
            mode,
            drivers,
            rides,
            evaluated_at_ms: now_ms,
        }
    }

    /// Synthesized positions are remembered per entity so markers stay put
    /// between passes; they are forgotten once the entity disappears or reports
    /// real coordinates.
    fn place(&mut self, kind: EntityKind, id: &str, actual: Option<GeoPoint>) -> Placement {
        if let Some(point) = actual {
            return Placement {
                point,
                synthesized: false,
            };
        }

        let key = (kind, id.to_string());
        if let Some(point) = self.synthesized.get(&key) {
            return Placement {
                point: *point,
                synthesized: true,
            };
        }

        let (dlat, dlng) = self.jitter.offset(self.radius_deg);
        let point = self.center.offset(
            dlat.clamp(-self.radius_deg, self.radius_deg),
            dlng.clamp(-self.radius_deg, self.radius_deg),
        );
        self.synthesized.insert(key, point);
        Placement {
            point,
            synthesized: true,
        }
    }

    fn prune(&mut self, store: &SnapshotStore) {
        self.synthesized.retain(|(kind, id), _| match kind {
            EntityKind::Drivers => store
                .driver(id)
                .map(|d| d.position().is_none())
                .unwrap_or(false),
            EntityKind::Rides => store
                .ride(id)
                .map(|r| r.origin().is_none())
                .unwrap_or(false),
            EntityKind::Passengers => false,
        });
    }

    pub fn synthesized_len(&self) -> usize {
        self.synthesized.len()
    }
}
