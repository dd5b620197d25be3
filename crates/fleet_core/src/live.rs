//! Async driver for the engine: feeds stream updates and operator commands in
//! from channels and pumps the clock on an interval.
//!
//! The engine itself never awaits. This loop is the only suspension point: it
//! waits for the next input or tick, drains whatever else is already queued,
//! then advances the engine once so a burst becomes a single pass.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::FleetEngine;
use crate::error::TransportError;
use crate::filter::DisplayMode;
use crate::geolocation::{GeolocationFailure, GeolocationFix};
use crate::records::EntityKind;
use crate::snapshot::Snapshot;

/// What a collection stream delivers.
#[derive(Debug, Clone)]
pub enum StreamUpdate {
    Snapshot(Snapshot),
    Failed(TransportError),
}

/// Actions from the surrounding UI.
#[derive(Debug, Clone)]
pub enum OperatorCommand {
    SetDisplayMode(DisplayMode),
    Refresh,
    CenterOn { kind: EntityKind, id: String },
    Locate(Result<GeolocationFix, GeolocationFailure>),
}

pub struct LiveInputs {
    pub streams: mpsc::Receiver<StreamUpdate>,
    pub commands: mpsc::Receiver<OperatorCommand>,
}

/// Wall clock in epoch milliseconds.
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

impl<F> TimeSource for F
where
    F: Fn() -> u64,
{
    fn now_ms(&self) -> u64 {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Runs until `cancel` fires, then disposes the engine and hands it back so
/// the caller can read the final summary.
pub async fn run_live(
    mut engine: FleetEngine,
    mut inputs: LiveInputs,
    time: impl TimeSource,
    pump_every: Duration,
    cancel: CancellationToken,
) -> FleetEngine {
    let mut pump = tokio::time::interval(pump_every);
    pump.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut streams_open = true;
    let mut commands_open = true;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            update = inputs.streams.recv(), if streams_open => match update {
                Some(update) => {
                    apply_update(&mut engine, update);
                    while let Ok(update) = inputs.streams.try_recv() {
                        apply_update(&mut engine, update);
                    }
                    engine.advance_to(time.now_ms());
                }
                None => {
                    debug!("stream channel closed");
                    streams_open = false;
                }
            },
            command = inputs.commands.recv(), if commands_open => match command {
                Some(command) => {
                    apply_command(&mut engine, command, &time);
                    while let Ok(command) = inputs.commands.try_recv() {
                        apply_command(&mut engine, command, &time);
                    }
                    engine.advance_to(time.now_ms());
                }
                None => {
                    debug!("command channel closed");
                    commands_open = false;
                }
            },
            _ = pump.tick() => {
                engine.advance_to(time.now_ms());
            }
        }
    }

    info!(passes = engine.passes(), "live loop stopped");
    engine.dispose();
    engine
}

fn apply_update(engine: &mut FleetEngine, update: StreamUpdate) {
    match update {
        StreamUpdate::Snapshot(snapshot) => engine.ingest(snapshot),
        StreamUpdate::Failed(error) => engine.stream_failed(error),
    }
}

fn apply_command(engine: &mut FleetEngine, command: OperatorCommand, time: &impl TimeSource) {
    match command {
        OperatorCommand::SetDisplayMode(mode) => engine.set_display_mode(mode),
        OperatorCommand::Refresh => engine.refresh(),
        OperatorCommand::CenterOn { kind, id } => {
            // Focus needs the marker as of now, so settle pending inputs first.
            engine.advance_to(time.now_ms());
            if let Err(err) = engine.center_on(kind, &id) {
                info!(%kind, id = %id, error = %err, "center_on had no effect");
            }
        }
        OperatorCommand::Locate(result) => {
            if let Err(err) = engine.locate_self(result) {
                warn!(error = %err, "self location not shown");
            }
        }
    }
}
