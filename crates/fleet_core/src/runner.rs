//! Engine runner: routes due events into the ingress schedule and runs the
//! pipeline schedule when a pass is owed.
//!
//! Each step pops the next due event from [EngineClock], inserts it as
//! [CurrentEvent], then runs the ingress schedule. Ingress systems only mark
//! the pipeline dirty; the pass itself runs once after the batch.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};

use crate::clock::{CurrentEvent, EngineClock, EventKind};
use crate::systems::{
    engine_started::engine_started_system,
    pipeline::{publish_view_system, reconcile_system, select_system},
    refresh::{display_mode_changed_system, manual_refresh_system, refresh_tick_system},
    snapshot_arrived::snapshot_arrived_system,
    PipelineState,
};

fn is_engine_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::EngineStarted)
        .unwrap_or(false)
}

fn is_snapshot_arrived(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| matches!(e.0.kind, EventKind::SnapshotArrived(_)))
        .unwrap_or(false)
}

fn is_refresh_tick(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::RefreshTick)
        .unwrap_or(false)
}

fn is_manual_refresh(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ManualRefresh)
        .unwrap_or(false)
}

fn is_display_mode_changed(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DisplayModeChanged)
        .unwrap_or(false)
}

/// Event-reacting systems, each gated on its event kind.
pub fn ingress_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((
        engine_started_system.run_if(is_engine_started),
        snapshot_arrived_system.run_if(is_snapshot_arrived),
        refresh_tick_system.run_if(is_refresh_tick),
        manual_refresh_system.run_if(is_manual_refresh),
        display_mode_changed_system.run_if(is_display_mode_changed),
    ));
    schedule
}

/// select → reconcile → publish, strictly in that order.
pub fn pipeline_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((select_system, reconcile_system, publish_view_system).chain());
    schedule
}

/// Runs the next event due at or before `until`. Returns `false` when none is due.
pub fn run_next_due_event(world: &mut World, ingress: &mut Schedule, until: u64) -> bool {
    let event = match world.resource_mut::<EngineClock>().pop_due(until) {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    ingress.run(world);
    true
}

/// Runs every event due at or before `until` (at most `max_steps`), returning the count.
pub fn run_due_events(world: &mut World, ingress: &mut Schedule, until: u64, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_due_event(world, ingress, until) {
        steps += 1;
    }
    steps
}

/// Runs one pass if any ingress system asked for it.
pub fn run_pipeline_if_dirty(world: &mut World, pipeline: &mut Schedule) -> bool {
    if !world.resource::<PipelineState>().dirty {
        return false;
    }
    pipeline.run(world);
    true
}
