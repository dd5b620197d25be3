//! `FleetEngine`: the owned, disposable facade over the engine world.
//!
//! Every input (snapshots, refreshes, display-mode changes) is queued as an
//! event at the engine's current time and takes effect on the next
//! [FleetEngine::advance_to]. All events due by then are processed in order,
//! followed by at most one select → reconcile → publish pass.

use bevy_ecs::prelude::{Schedule, World};
use tracing::{debug, info, warn};

use crate::clock::{EngineClock, EventKind};
use crate::config::EngineConfig;
use crate::error::{ConfigError, FocusError, LocateError, TransportError};
use crate::filter::{DesiredSet, DisplayMode, FilterPipeline, JitterSource, SeededJitter};
use crate::geo::GeoPoint;
use crate::geolocation::{GeolocationFailure, GeolocationFix};
use crate::marker::{MapSurface, MarkerReconciler, ReconcileReport, SelfLocationOutcome};
use crate::presence::{classify, PresenceState};
use crate::records::{DriverRecord, EntityKind, PassengerRecord, RideRecord};
use crate::runner::{ingress_schedule, pipeline_schedule, run_due_events, run_pipeline_if_dirty};
use crate::snapshot::{PendingSnapshots, Snapshot, SnapshotStore, StreamHealth, StreamStatus};
use crate::systems::{LastReconcile, PipelineState, RequestedDisplayMode};
use crate::view::{
    DashboardCounts, RandomWaitingEstimate, ViewNotifier, ViewSummary, WaitingEstimator,
    WaitingEstimatorResource,
};

/// Upper bound on events processed by one `advance_to`, so a misconfigured
/// clock jump cannot spin forever.
const MAX_EVENTS_PER_ADVANCE: usize = 100_000;

pub struct FleetEngineBuilder {
    surface: Box<dyn MapSurface>,
    config: EngineConfig,
    jitter: Option<Box<dyn JitterSource>>,
    waiting: Option<Box<dyn WaitingEstimator>>,
    mode: DisplayMode,
}

impl FleetEngineBuilder {
    pub fn new(surface: Box<dyn MapSurface>) -> Self {
        Self {
            surface,
            config: EngineConfig::default(),
            jitter: None,
            waiting: None,
            mode: DisplayMode::default(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the jitter used for synthesized coordinates (seeded from the config otherwise).
    pub fn jitter(mut self, jitter: Box<dyn JitterSource>) -> Self {
        self.jitter = Some(jitter);
        self
    }

    pub fn waiting_estimator(mut self, estimator: Box<dyn WaitingEstimator>) -> Self {
        self.waiting = Some(estimator);
        self
    }

    pub fn display_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builds the world and runs the start-up pass at `now_ms`.
    pub fn start(self, now_ms: u64) -> Result<FleetEngine, ConfigError> {
        self.config.validate()?;
        let config = self.config;

        let jitter = self
            .jitter
            .unwrap_or_else(|| Box::new(SeededJitter::new(config.seed)) as Box<dyn JitterSource>);
        // Offset the seed so the two random streams are not identical.
        let waiting = self.waiting.unwrap_or_else(|| {
            Box::new(RandomWaitingEstimate::new(config.seed.map(|s| s.wrapping_add(1))))
                as Box<dyn WaitingEstimator>
        });

        let mut clock = EngineClock::starting_at(now_ms);
        clock.schedule_at(now_ms, EventKind::EngineStarted);

        let mut world = World::new();
        world.insert_resource(FilterPipeline::new(
            config.city_center,
            config.synthetic_jitter_deg,
            jitter,
        ));
        world.insert_resource(clock);
        world.insert_resource(config);
        world.insert_resource(SnapshotStore::new());
        world.insert_resource(PendingSnapshots::default());
        world.insert_resource(StreamHealth::default());
        world.insert_resource(self.mode);
        world.insert_resource(RequestedDisplayMode::default());
        world.insert_resource(DesiredSet::default());
        world.insert_resource(MarkerReconciler::new(self.surface));
        world.insert_resource(LastReconcile::default());
        world.insert_resource(ViewNotifier::default());
        world.insert_resource(WaitingEstimatorResource(waiting));
        world.insert_resource(PipelineState::default());

        let mut engine = FleetEngine {
            world,
            ingress: ingress_schedule(),
            pipeline: pipeline_schedule(),
            disposed: false,
        };
        engine.advance_to(now_ms);
        Ok(engine)
    }
}

pub struct FleetEngine {
    world: World,
    ingress: Schedule,
    pipeline: Schedule,
    disposed: bool,
}

impl FleetEngine {
    pub fn builder(surface: Box<dyn MapSurface>) -> FleetEngineBuilder {
        FleetEngineBuilder::new(surface)
    }

    /// Queues a full-collection snapshot. A newer snapshot of the same kind
    /// replaces one that has not been applied yet.
    pub fn ingest(&mut self, snapshot: Snapshot) {
        if self.disposed {
            debug!(kind = %snapshot.kind(), "ignoring snapshot after dispose");
            return;
        }
        let kind = snapshot.kind();
        let superseded = self.world.resource_mut::<PendingSnapshots>().put(snapshot);
        if superseded {
            debug!(%kind, "unapplied snapshot superseded");
        }
        let mut clock = self.world.resource_mut::<EngineClock>();
        let event = EventKind::SnapshotArrived(kind);
        if !clock.has_pending(event) {
            let now = clock.now();
            clock.schedule_at(now, event);
        }
    }

    /// Records a stream failure. The last snapshot of that kind is kept.
    pub fn stream_failed(&mut self, error: TransportError) {
        if self.disposed {
            return;
        }
        warn!(kind = %error.kind, error = %error.message, "collection stream failed; keeping last snapshot");
        self.world
            .resource_mut::<StreamHealth>()
            .record_failure(error.kind, error.message);
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.disposed {
            debug!(?mode, "ignoring display mode change after dispose");
            return;
        }
        self.world.resource_mut::<RequestedDisplayMode>().0 = Some(mode);
        self.schedule_now(EventKind::DisplayModeChanged);
    }

    /// Requests a pass on the current snapshot without new stream data.
    pub fn refresh(&mut self) {
        if self.disposed {
            debug!("ignoring refresh after dispose");
            return;
        }
        self.schedule_now(EventKind::ManualRefresh);
    }

    fn schedule_now(&mut self, kind: EventKind) {
        let mut clock = self.world.resource_mut::<EngineClock>();
        let now = clock.now();
        clock.schedule_at(now, kind);
    }

    /// Processes every event due at or before `now_ms`, then runs one pass if
    /// any of them asked for it. Returns that pass's report.
    ///
    /// The engine clock never moves backwards. A `now_ms` earlier than
    /// [`FleetEngine::now`] still applies inputs queued at the engine's own time.
    pub fn advance_to(&mut self, now_ms: u64) -> Option<ReconcileReport> {
        if self.disposed {
            debug!(now_ms, "ignoring advance after dispose");
            return None;
        }
        // A caller clock behind ours must not hold back inputs queued at our `now`.
        let until = now_ms.max(self.world.resource::<EngineClock>().now());
        let steps = run_due_events(&mut self.world, &mut self.ingress, until, MAX_EVENTS_PER_ADVANCE);
        if steps == MAX_EVENTS_PER_ADVANCE {
            warn!(now_ms, until, "event budget exhausted; remaining events deferred");
        }
        self.world.resource_mut::<EngineClock>().advance_to(now_ms);

        if !run_pipeline_if_dirty(&mut self.world, &mut self.pipeline) {
            return None;
        }
        self.world.resource::<LastReconcile>().0.clone()
    }

    /// Counters from the last published pass.
    pub fn counts(&self) -> DashboardCounts {
        match self.summary() {
            Some(summary) => summary.counts,
            None => {
                let counters = self.reconciler().counters();
                DashboardCounts {
                    drivers_online: counters.drivers_online,
                    active_rides: counters.active_rides,
                    waiting_passengers_estimate: 0,
                }
            }
        }
    }

    pub fn summary(&self) -> Option<&ViewSummary> {
        self.world.resource::<ViewNotifier>().last()
    }

    pub fn driver(&self, id: &str) -> Option<&DriverRecord> {
        self.store().driver(id)
    }

    pub fn ride(&self, id: &str) -> Option<&RideRecord> {
        self.store().ride(id)
    }

    pub fn passenger(&self, id: &str) -> Option<&PassengerRecord> {
        self.store().passenger(id)
    }

    /// Presence of a driver at the engine's current time.
    pub fn presence_of(&self, driver_id: &str) -> Option<PresenceState> {
        let now = self.now();
        self.driver(driver_id).map(|d| classify(d, now))
    }

    /// Focuses the map on a rendered entity and opens its popup.
    pub fn center_on(&mut self, kind: EntityKind, id: &str) -> Result<GeoPoint, FocusError> {
        if self.disposed {
            return Err(FocusError::Disposed);
        }
        let zoom = self.world.resource::<EngineConfig>().focus_zoom;
        let result = self
            .world
            .resource_mut::<MarkerReconciler>()
            .center_on(kind, id, zoom);
        if let Err(err) = &result {
            debug!(%kind, id, error = %err, "center_on had nothing to focus");
        }
        result
    }

    /// Shows the result of a geolocation request. Failures change nothing.
    pub fn locate_self(
        &mut self,
        result: Result<GeolocationFix, GeolocationFailure>,
    ) -> Result<SelfLocationOutcome, LocateError> {
        if self.disposed {
            return Err(LocateError::Disposed);
        }
        let fix = match result {
            Ok(fix) => fix,
            Err(failure) => {
                warn!(?failure, message = failure.user_message(), "geolocation failed");
                return Err(failure.into());
            }
        };
        let zoom = self.world.resource::<EngineConfig>().self_location_zoom;
        let outcome = self
            .world
            .resource_mut::<MarkerReconciler>()
            .place_self_location(fix, zoom)?;
        debug!(?outcome, accuracy_m = fix.accuracy_m, "self location shown");
        Ok(outcome)
    }

    /// Registers a callback invoked after every pass.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&ViewSummary) + Send + Sync + 'static,
    {
        if self.disposed {
            return;
        }
        self.world.resource_mut::<ViewNotifier>().subscribe(subscriber);
    }

    /// True iff all three collections are empty.
    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    pub fn has_received_any(&self) -> bool {
        self.world.resource::<StreamHealth>().has_received_any()
    }

    pub fn stream_status(&self, kind: EntityKind) -> &StreamStatus {
        self.world.resource::<StreamHealth>().status(kind)
    }

    pub fn store(&self) -> &SnapshotStore {
        self.world.resource::<SnapshotStore>()
    }

    pub fn reconciler(&self) -> &MarkerReconciler {
        self.world.resource::<MarkerReconciler>()
    }

    pub fn display_mode(&self) -> DisplayMode {
        *self.world.resource::<DisplayMode>()
    }

    pub fn config(&self) -> &EngineConfig {
        self.world.resource::<EngineConfig>()
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<EngineClock>().now()
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.world.resource::<EngineClock>().next_event_time()
    }

    pub fn passes(&self) -> u64 {
        self.world.resource::<PipelineState>().passes
    }

    /// Cancels the periodic refresh, removes every marker this engine drew and
    /// drops subscribers. Later calls are no-ops. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let cancelled = self.world.resource_mut::<EngineClock>().clear();
        let removed = self.world.resource_mut::<MarkerReconciler>().teardown();
        self.world.resource_mut::<ViewNotifier>().clear();
        info!(cancelled_events = cancelled, removed_markers = removed, "engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for FleetEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
