use bevy_ecs::prelude::{Res, ResMut};
use tracing::{info, warn};

use crate::clock::{CurrentEvent, EngineClock, EventKind};
use crate::config::EngineConfig;
use crate::marker::MarkerReconciler;

use super::PipelineState;

/// Places the city-centre anchor and arms the periodic refresh.
pub fn engine_started_system(
    mut clock: ResMut<EngineClock>,
    mut reconciler: ResMut<MarkerReconciler>,
    mut pipeline: ResMut<PipelineState>,
    config: Res<EngineConfig>,
    event: Res<CurrentEvent>,
) {
    if event.0.kind != EventKind::EngineStarted {
        return;
    }

    if let Err(err) = reconciler.place_anchor(config.city_center, &config.anchor_label) {
        warn!(error = %err, "failed to place anchor marker");
    }

    if !clock.has_pending(EventKind::RefreshTick) {
        clock.schedule_in(config.refresh_interval_ms, EventKind::RefreshTick);
    }
    pipeline.mark_dirty();
    info!(
        now_ms = clock.now(),
        refresh_interval_ms = config.refresh_interval_ms,
        "engine started"
    );
}
