use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, info};

use crate::clock::{CurrentEvent, EngineClock, EventKind};
use crate::config::EngineConfig;
use crate::filter::DisplayMode;

use super::{PipelineState, RequestedDisplayMode};

/// Periodic pass: re-runs the pipeline on the last-known snapshot so presence
/// decays with time, then re-arms itself.
pub fn refresh_tick_system(
    mut clock: ResMut<EngineClock>,
    mut pipeline: ResMut<PipelineState>,
    config: Res<EngineConfig>,
    event: Res<CurrentEvent>,
) {
    if event.0.kind != EventKind::RefreshTick {
        return;
    }
    pipeline.mark_dirty();
    clock.schedule_in(config.refresh_interval_ms, EventKind::RefreshTick);
    debug!(now_ms = clock.now(), "refresh tick");
}

pub fn manual_refresh_system(mut pipeline: ResMut<PipelineState>, event: Res<CurrentEvent>) {
    if event.0.kind != EventKind::ManualRefresh {
        return;
    }
    pipeline.mark_dirty();
    debug!("manual refresh requested");
}

pub fn display_mode_changed_system(
    mut requested: ResMut<RequestedDisplayMode>,
    mut mode: ResMut<DisplayMode>,
    mut pipeline: ResMut<PipelineState>,
    event: Res<CurrentEvent>,
) {
    if event.0.kind != EventKind::DisplayModeChanged {
        return;
    }
    if let Some(next) = requested.0.take() {
        if *mode != next {
            info!(from = ?*mode, to = ?next, "display mode changed");
        }
        *mode = next;
    }
    pipeline.mark_dirty();
}
