#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use fleet_core::config::EngineConfig;
use fleet_core::engine::FleetEngine;
use fleet_core::filter::DisplayMode;
use fleet_core::test_helpers::{
    test_time, FixedJitter, FixedWaitingEstimate, RecordingSurface, SurfaceJournal,
};
use fleet_core::view::ViewSummary;

/// Engine wired to a recording surface with deterministic jitter and waiting estimate.
pub struct TestEngineBuilder {
    config: EngineConfig,
    mode: DisplayMode,
    jitter: FixedJitter,
    waiting: u32,
}

impl Default for TestEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            mode: DisplayMode::All,
            jitter: FixedJitter::none(),
            waiting: 3,
        }
    }
}

impl TestEngineBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_jitter(mut self, dlat: f64, dlng: f64) -> Self {
        self.jitter = FixedJitter::new(dlat, dlng);
        self
    }

    pub fn with_waiting(mut self, estimate: u32) -> Self {
        self.waiting = estimate;
        self
    }

    /// Starts the engine at `test_time()`.
    pub fn start(self) -> (FleetEngine, SurfaceJournal) {
        let surface = RecordingSurface::new();
        let journal = surface.journal();
        let engine = FleetEngine::builder(Box::new(surface))
            .config(self.config)
            .display_mode(self.mode)
            .jitter(Box::new(self.jitter))
            .waiting_estimator(Box::new(FixedWaitingEstimate(self.waiting)))
            .start(test_time())
            .expect("engine starts");
        (engine, journal)
    }
}

/// Collects every summary published after subscription.
pub fn record_summaries(engine: &mut FleetEngine) -> Arc<Mutex<Vec<ViewSummary>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe(move |summary| sink.lock().expect("lock").push(summary.clone()));
    seen
}
