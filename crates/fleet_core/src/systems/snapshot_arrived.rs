use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, info, warn};

use crate::clock::{CurrentEvent, EngineClock, EventKind};
use crate::presence::PresenceTally;
use crate::records::EntityKind;
use crate::snapshot::{PendingSnapshots, SnapshotStore, StreamHealth};

use super::PipelineState;

/// Swaps the pending snapshot for the event's kind into the store.
pub fn snapshot_arrived_system(
    mut pending: ResMut<PendingSnapshots>,
    mut store: ResMut<SnapshotStore>,
    mut health: ResMut<StreamHealth>,
    mut pipeline: ResMut<PipelineState>,
    clock: Res<EngineClock>,
    event: Res<CurrentEvent>,
) {
    let EventKind::SnapshotArrived(kind) = event.0.kind else {
        return;
    };

    let Some(snapshot) = pending.take(kind) else {
        debug!(%kind, "no pending snapshot for event; already applied");
        return;
    };

    let applied = store.apply(snapshot);
    health.record_success(kind, clock.now());
    if applied.duplicate_ids > 0 {
        warn!(
            %kind,
            duplicates = applied.duplicate_ids,
            "snapshot contained duplicate ids; last occurrence kept"
        );
    }

    if kind == EntityKind::Drivers {
        let tally = PresenceTally::from_drivers(store.drivers(), clock.now());
        info!(
            records = applied.records,
            generation = applied.generation,
            online = tally.online(),
            busy = tally.online_busy,
            offline = tally.offline,
            "drivers snapshot applied"
        );
    } else {
        info!(
            %kind,
            records = applied.records,
            generation = applied.generation,
            "snapshot applied"
        );
    }
    pipeline.mark_dirty();
}
