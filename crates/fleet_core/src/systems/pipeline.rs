//! One pass: select the desired set, reconcile markers, publish the summary.

use bevy_ecs::prelude::{Res, ResMut};
use tracing::info;

use crate::clock::EngineClock;
use crate::config::EngineConfig;
use crate::filter::{DesiredSet, DisplayMode, FilterPipeline};
use crate::marker::MarkerReconciler;
use crate::snapshot::SnapshotStore;
use crate::view::{build_summary, SummaryContext, ViewNotifier, WaitingEstimatorResource};

use super::{LastReconcile, PipelineState};

pub fn select_system(
    mut filter: ResMut<FilterPipeline>,
    mut desired: ResMut<DesiredSet>,
    store: Res<SnapshotStore>,
    mode: Res<DisplayMode>,
    clock: Res<EngineClock>,
) {
    *desired = filter.select(&store, *mode, clock.now());
}

pub fn reconcile_system(
    mut reconciler: ResMut<MarkerReconciler>,
    mut last: ResMut<LastReconcile>,
    desired: Res<DesiredSet>,
) {
    last.0 = Some(reconciler.reconcile(&desired));
}

pub fn publish_view_system(
    mut notifier: ResMut<ViewNotifier>,
    mut estimator: ResMut<WaitingEstimatorResource>,
    mut pipeline: ResMut<PipelineState>,
    last: Res<LastReconcile>,
    store: Res<SnapshotStore>,
    reconciler: Res<MarkerReconciler>,
    mode: Res<DisplayMode>,
    clock: Res<EngineClock>,
    config: Res<EngineConfig>,
) {
    pipeline.dirty = false;
    pipeline.passes += 1;

    let report = last.0.clone().unwrap_or_default();
    let summary = build_summary(
        &store,
        SummaryContext {
            pass: pipeline.passes,
            now_ms: clock.now(),
            mode: *mode,
            counters: reconciler.counters(),
            waiting_estimate: estimator.0.estimate(),
            preview_len: config.online_preview_len,
            commission_rate: config.platform_commission_rate,
        },
        report,
    );
    info!(
        pass = summary.pass,
        mode = ?summary.mode,
        drivers_online = summary.counts.drivers_online,
        active_rides = summary.counts.active_rides,
        created = summary.reconcile.created,
        updated = summary.reconcile.updated,
        removed = summary.reconcile.removed,
        failures = summary.reconcile.failures.len(),
        "pipeline pass complete"
    );
    notifier.publish(summary);
}
