//! View notifier: the summary published after every reconciliation pass and
//! the fan-out to whoever renders counters and tables.

use std::fmt;

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::filter::DisplayMode;
use crate::marker::{MarkerCounters, ReconcileReport};
use crate::presence::{classify, LastSeen, PresenceState, PresenceTally};
use crate::records::{EntityKind, RideRecord, RideStatus};
use crate::snapshot::SnapshotStore;

/// Counters shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub drivers_online: usize,
    pub active_rides: usize,
    /// Not backed by data: a random figure in `1..=5` drawn on every pass.
    /// Display it as an estimate, never as a measurement.
    pub waiting_passengers_estimate: u32,
}

/// Produces the waiting-passenger estimate.
pub trait WaitingEstimator: Send + Sync + fmt::Debug {
    fn estimate(&mut self) -> u32;
}

/// Uniform random estimate in `1..=5`.
#[derive(Debug)]
pub struct RandomWaitingEstimate {
    rng: StdRng,
}

impl RandomWaitingEstimate {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 5;

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl WaitingEstimator for RandomWaitingEstimate {
    fn estimate(&mut self) -> u32 {
        self.rng.gen_range(Self::MIN..=Self::MAX)
    }
}

/// Resource wrapper for the estimator trait object.
#[derive(Debug, Resource)]
pub struct WaitingEstimatorResource(pub Box<dyn WaitingEstimator>);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RevenueSummary {
    pub completed_rides: usize,
    /// Sum of fares of completed rides.
    pub gross_revenue: f64,
    pub platform_commission: f64,
}

impl RevenueSummary {
    pub fn from_rides<'a>(rides: impl IntoIterator<Item = &'a RideRecord>, commission_rate: f64) -> Self {
        let mut summary = Self::default();
        for ride in rides {
            if ride.status == RideStatus::Completed {
                summary.completed_rides += 1;
                summary.gross_revenue += ride.fare;
            }
        }
        summary.platform_commission = summary.gross_revenue * commission_rate;
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityTotals {
    pub drivers: usize,
    pub rides: usize,
    pub passengers: usize,
}

impl EntityTotals {
    pub fn of(store: &SnapshotStore) -> Self {
        Self {
            drivers: store.len(EntityKind::Drivers),
            rides: store.len(EntityKind::Rides),
            passengers: store.len(EntityKind::Passengers),
        }
    }
}

/// One row of the online-driver preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnlineDriverEntry {
    pub id: String,
    pub display_name: String,
    pub busy: bool,
    pub last_seen: Option<LastSeen>,
    /// True when the driver reported real coordinates.
    pub locatable: bool,
}

/// First `limit` online drivers, in snapshot order.
pub fn online_preview(store: &SnapshotStore, now_ms: u64, limit: usize) -> Vec<OnlineDriverEntry> {
    store
        .drivers()
        .iter()
        .filter_map(|driver| {
            let presence = classify(driver, now_ms);
            presence.is_online().then(|| OnlineDriverEntry {
                id: driver.id.clone(),
                display_name: driver.name_or_default().to_string(),
                busy: presence == PresenceState::OnlineBusy,
                last_seen: LastSeen::of(driver, now_ms),
                locatable: driver.position().is_some(),
            })
        })
        .take(limit)
        .collect()
}

/// Everything the UI needs after one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub pass: u64,
    pub generated_at_ms: u64,
    pub mode: DisplayMode,
    pub counts: DashboardCounts,
    pub presence: PresenceTally,
    pub totals: EntityTotals,
    pub revenue: RevenueSummary,
    pub online_preview: Vec<OnlineDriverEntry>,
    pub reconcile: ReconcileReport,
}

/// Inputs to [build_summary] that do not come from the store.
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext {
    pub pass: u64,
    pub now_ms: u64,
    pub mode: DisplayMode,
    pub counters: MarkerCounters,
    pub waiting_estimate: u32,
    pub preview_len: usize,
    pub commission_rate: f64,
}

pub fn build_summary(store: &SnapshotStore, ctx: SummaryContext, reconcile: ReconcileReport) -> ViewSummary {
    ViewSummary {
        pass: ctx.pass,
        generated_at_ms: ctx.now_ms,
        mode: ctx.mode,
        counts: DashboardCounts {
            drivers_online: ctx.counters.drivers_online,
            active_rides: ctx.counters.active_rides,
            waiting_passengers_estimate: ctx.waiting_estimate,
        },
        presence: PresenceTally::from_drivers(store.drivers(), ctx.now_ms),
        totals: EntityTotals::of(store),
        revenue: RevenueSummary::from_rides(store.rides(), ctx.commission_rate),
        online_preview: online_preview(store, ctx.now_ms, ctx.preview_len),
        reconcile,
    }
}

type Subscriber = Box<dyn FnMut(&ViewSummary) + Send + Sync>;

/// Fans each published summary out to every subscriber, in subscription order.
#[derive(Default, Resource)]
pub struct ViewNotifier {
    subscribers: Vec<Subscriber>,
    last: Option<ViewSummary>,
}

impl fmt::Debug for ViewNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewNotifier")
            .field("subscribers", &self.subscribers.len())
            .field("last", &self.last)
            .finish()
    }
}

impl ViewNotifier {
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&ViewSummary) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn publish(&mut self, summary: ViewSummary) {
        for subscriber in &mut self.subscribers {
            subscriber(&summary);
        }
        self.last = Some(summary);
    }

    pub fn last(&self) -> Option<&ViewSummary> {
        self.last.as_ref()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Drops every subscriber. The last summary is kept.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}
