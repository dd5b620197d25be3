//! Snapshot aggregation: the authoritative in-memory copy of the three collections.
//!
//! Each stream delivers full-collection snapshots. [SnapshotStore::apply] swaps
//! the whole collection for that kind in one step, so a kind is always exactly
//! one snapshot generation and the other kinds are never touched.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::records::{DriverRecord, EntityKind, PassengerRecord, Record, RideRecord};

/// Id-keyed records of one kind, kept in snapshot order.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    records: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Record> Collection<T> {
    /// Builds a collection from one snapshot. Duplicate ids are last-wins and keep
    /// the position of their first occurrence.
    pub fn from_records(records: impl IntoIterator<Item = T>) -> (Self, usize) {
        let mut collection = Self::default();
        let mut duplicates = 0;
        for record in records {
            match collection.index.get(record.id()) {
                Some(&slot) => {
                    collection.records[slot] = record;
                    duplicates += 1;
                }
                None => {
                    collection
                        .index
                        .insert(record.id().to_string(), collection.records.len());
                    collection.records.push(record);
                }
            }
        }
        (collection, duplicates)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a, T: Record> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A complete replacement set of records for one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Drivers(Vec<DriverRecord>),
    Rides(Vec<RideRecord>),
    Passengers(Vec<PassengerRecord>),
}

impl Snapshot {
    pub fn kind(&self) -> EntityKind {
        match self {
            Snapshot::Drivers(_) => EntityKind::Drivers,
            Snapshot::Rides(_) => EntityKind::Rides,
            Snapshot::Passengers(_) => EntityKind::Passengers,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Snapshot::Drivers(records) => records.len(),
            Snapshot::Rides(records) => records.len(),
            Snapshot::Passengers(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed view of a record of any kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Driver(&'a DriverRecord),
    Ride(&'a RideRecord),
    Passenger(&'a PassengerRecord),
}

impl EntityRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Driver(r) => &r.id,
            EntityRef::Ride(r) => &r.id,
            EntityRef::Passenger(r) => &r.id,
        }
    }
}

/// Outcome of one [SnapshotStore::apply].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedSnapshot {
    pub kind: EntityKind,
    pub records: usize,
    pub duplicate_ids: usize,
    pub generation: u64,
}

#[derive(Debug, Default, Resource)]
pub struct SnapshotStore {
    drivers: Collection<DriverRecord>,
    rides: Collection<RideRecord>,
    passengers: Collection<PassengerRecord>,
    generations: [u64; 3],
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection for the snapshot's kind.
    pub fn apply(&mut self, snapshot: Snapshot) -> AppliedSnapshot {
        let kind = snapshot.kind();
        let (records, duplicate_ids) = match snapshot {
            Snapshot::Drivers(records) => {
                let (collection, duplicates) = Collection::from_records(records);
                self.drivers = collection;
                (self.drivers.len(), duplicates)
            }
            Snapshot::Rides(records) => {
                let (collection, duplicates) = Collection::from_records(records);
                self.rides = collection;
                (self.rides.len(), duplicates)
            }
            Snapshot::Passengers(records) => {
                let (collection, duplicates) = Collection::from_records(records);
                self.passengers = collection;
                (self.passengers.len(), duplicates)
            }
        };
        let generation = &mut self.generations[kind.index()];
        *generation += 1;
        AppliedSnapshot {
            kind,
            records,
            duplicate_ids,
            generation: *generation,
        }
    }

    pub fn drivers(&self) -> &Collection<DriverRecord> {
        &self.drivers
    }

    pub fn rides(&self) -> &Collection<RideRecord> {
        &self.rides
    }

    pub fn passengers(&self) -> &Collection<PassengerRecord> {
        &self.passengers
    }

    pub fn driver(&self, id: &str) -> Option<&DriverRecord> {
        self.drivers.get(id)
    }

    pub fn ride(&self, id: &str) -> Option<&RideRecord> {
        self.rides.get(id)
    }

    pub fn passenger(&self, id: &str) -> Option<&PassengerRecord> {
        self.passengers.get(id)
    }

    /// Every record of `kind`, in snapshot order.
    pub fn all(&self, kind: EntityKind) -> Vec<EntityRef<'_>> {
        match kind {
            EntityKind::Drivers => self.drivers.iter().map(EntityRef::Driver).collect(),
            EntityKind::Rides => self.rides.iter().map(EntityRef::Ride).collect(),
            EntityKind::Passengers => self.passengers.iter().map(EntityRef::Passenger).collect(),
        }
    }

    pub fn by_id(&self, kind: EntityKind, id: &str) -> Option<EntityRef<'_>> {
        match kind {
            EntityKind::Drivers => self.driver(id).map(EntityRef::Driver),
            EntityKind::Rides => self.ride(id).map(EntityRef::Ride),
            EntityKind::Passengers => self.passenger(id).map(EntityRef::Passenger),
        }
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Drivers => self.drivers.len(),
            EntityKind::Rides => self.rides.len(),
            EntityKind::Passengers => self.passengers.len(),
        }
    }

    /// True iff all three collections are empty.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty() && self.rides.is_empty() && self.passengers.is_empty()
    }

    /// Number of snapshots applied for `kind` so far.
    pub fn generation(&self, kind: EntityKind) -> u64 {
        self.generations[kind.index()]
    }
}

/// Snapshots received but not yet applied, one slot per kind.
#[derive(Debug, Default, Resource)]
pub struct PendingSnapshots {
    slots: [Option<Snapshot>; 3],
}

impl PendingSnapshots {
    /// Stores `snapshot`, returning true if it superseded an unapplied one of the same kind.
    pub fn put(&mut self, snapshot: Snapshot) -> bool {
        self.slots[snapshot.kind().index()]
            .replace(snapshot)
            .is_some()
    }

    pub fn take(&mut self, kind: EntityKind) -> Option<Snapshot> {
        self.slots[kind.index()].take()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Per-kind stream bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    pub received: bool,
    pub last_success_at: Option<u64>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Default, Resource)]
pub struct StreamHealth {
    streams: [StreamStatus; 3],
}

impl StreamHealth {
    pub fn record_success(&mut self, kind: EntityKind, at_ms: u64) {
        let status = &mut self.streams[kind.index()];
        status.received = true;
        status.last_success_at = Some(at_ms);
        status.consecutive_failures = 0;
        status.last_error = None;
    }

    pub fn record_failure(&mut self, kind: EntityKind, message: impl Into<String>) {
        let status = &mut self.streams[kind.index()];
        status.consecutive_failures += 1;
        status.last_error = Some(message.into());
    }

    pub fn status(&self, kind: EntityKind) -> &StreamStatus {
        &self.streams[kind.index()]
    }

    pub fn has_received_any(&self) -> bool {
        self.streams.iter().any(|s| s.received)
    }
}
