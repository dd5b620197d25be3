//! Engine clock: wall time in epoch milliseconds plus a queue of scheduled events.
//!
//! Every entry point into the engine (stream snapshots, the periodic refresh,
//! manual refresh, display-mode changes) becomes an [Event]. The runner pops
//! due events one at a time, so each runs to completion before the next.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;

use crate::records::EntityKind;

pub const ONE_SEC_MS: u64 = 1000;
pub const ONE_MIN_MS: u64 = 60 * ONE_SEC_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EngineStarted,
    SnapshotArrived(EntityKind),
    RefreshTick,
    ManualRefresh,
    DisplayModeChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    seq: u64,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by timestamp, FIFO on ties.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed by the ingress schedule.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct EngineClock {
    now: u64,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl EngineClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now: now_ms,
            ..Self::default()
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedules `kind` at `timestamp`; times in the past are clamped to `now`.
    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind) {
        let event = Event {
            timestamp: timestamp.max(self.now),
            kind,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.events.push(event);
    }

    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind) {
        self.schedule_at(self.now.saturating_add(delay_ms), kind);
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = self.now.max(event.timestamp);
        Some(event)
    }

    /// Pops the next event only if it is due at or before `until`.
    pub fn pop_due(&mut self, until: u64) -> Option<Event> {
        match self.events.peek() {
            Some(event) if event.timestamp <= until => self.pop_next(),
            _ => None,
        }
    }

    /// Moves wall time forward. Never moves it backwards.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now = self.now.max(now_ms);
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|e| e.timestamp)
    }

    pub fn has_pending(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every scheduled event, returning how many were cancelled.
    pub fn clear(&mut self) -> usize {
        let cancelled = self.events.len();
        self.events.clear();
        cancelled
    }
}
