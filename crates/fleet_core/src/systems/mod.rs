//! Engine systems. Ingress systems react to the current event and mark the
//! pipeline dirty; pipeline systems run select → reconcile → publish once per
//! batch of events.

use bevy_ecs::prelude::Resource;

use crate::filter::DisplayMode;
use crate::marker::ReconcileReport;

pub mod engine_started;
pub mod pipeline;
pub mod refresh;
pub mod snapshot_arrived;

/// Whether a pass is owed, and how many have run.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct PipelineState {
    pub dirty: bool,
    pub passes: u64,
}

impl PipelineState {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Report of the most recent reconciliation, handed from reconcile to publish.
#[derive(Debug, Clone, Default, Resource)]
pub struct LastReconcile(pub Option<ReconcileReport>);

/// Display mode requested by the UI, applied when its event is processed.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct RequestedDisplayMode(pub Option<DisplayMode>);
