//! Recorded stream feeds: one JSON object per line, each stamped with the
//! wall-clock millisecond it happened at.
//!
//! ```text
//! {"at_ms": 1700000000000, "type": "snapshot", "kind": "drivers", "documents": [...]}
//! {"at_ms": 1700000004000, "type": "stream_error", "kind": "rides", "message": "permission denied"}
//! {"at_ms": 1700000009000, "type": "display_mode", "mode": "rides"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::io::BufRead;

use fleet_core::documents::decode_snapshot;
use fleet_core::engine::FleetEngine;
use fleet_core::error::{DecodeError, LocateError, TransportError};
use fleet_core::filter::DisplayMode;
use fleet_core::geolocation::{GeolocationFailure, GeolocationFix};
use fleet_core::records::EntityKind;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: FeedAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedAction {
    Snapshot { kind: EntityKind, documents: Value },
    StreamError { kind: EntityKind, message: String },
    DisplayMode { mode: DisplayMode },
    Refresh,
    Geolocation { lat: f64, lng: f64, accuracy_m: f64 },
    GeolocationFailed { reason: GeolocationFailure },
    CenterOn { kind: EntityKind, id: String },
}

/// Parses a feed and orders it by time. Events sharing a timestamp keep file order.
pub fn read_feed(reader: impl BufRead) -> Result<Vec<FeedEvent>, DecodeError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|err| DecodeError::Malformed(format!("line {line_no}: {err}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: FeedEvent = serde_json::from_str(trimmed)
            .map_err(|err| DecodeError::Malformed(format!("line {line_no}: {err}")))?;
        events.push(event);
    }
    events.sort_by_key(|event| event.at_ms);
    Ok(events)
}

/// Totals of what a replay did, for the closing log line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub passes: usize,
    pub rejected: usize,
}

/// Feeds `events` into `engine`. Events at the same instant are applied
/// together and followed by a single advance.
pub fn replay(engine: &mut FleetEngine, events: &[FeedEvent]) -> ReplayStats {
    let mut stats = ReplayStats::default();
    let mut start = 0;

    while start < events.len() {
        let at_ms = events[start].at_ms;
        let end = events[start..]
            .iter()
            .position(|event| event.at_ms != at_ms)
            .map_or(events.len(), |offset| start + offset);

        if engine.advance_to(at_ms).is_some() {
            stats.passes += 1;
        }
        for event in &events[start..end] {
            stats.events += 1;
            if !apply(engine, &event.action) {
                stats.rejected += 1;
            }
        }
        if engine.advance_to(at_ms).is_some() {
            stats.passes += 1;
        }
        start = end;
    }
    stats
}

fn apply(engine: &mut FleetEngine, action: &FeedAction) -> bool {
    match action {
        FeedAction::Snapshot { kind, documents } => match decode_snapshot(*kind, documents) {
            Ok(decoded) => {
                engine.ingest(decoded.snapshot);
                true
            }
            Err(err) => {
                // A payload the store would never send is treated like a failed read.
                warn!(%kind, error = %err, "undecodable snapshot");
                engine.stream_failed(TransportError::new(*kind, err.to_string()));
                false
            }
        },
        FeedAction::StreamError { kind, message } => {
            engine.stream_failed(TransportError::new(*kind, message.clone()));
            true
        }
        FeedAction::DisplayMode { mode } => {
            engine.set_display_mode(*mode);
            true
        }
        FeedAction::Refresh => {
            engine.refresh();
            true
        }
        FeedAction::Geolocation { lat, lng, accuracy_m } => {
            let Some(fix) = GeolocationFix::new(*lat, *lng, *accuracy_m) else {
                warn!(lat, lng, "geolocation fix outside valid range");
                return false;
            };
            engine.locate_self(Ok(fix)).is_ok()
        }
        FeedAction::GeolocationFailed { reason } => {
            match engine.locate_self(Err(*reason)) {
                Err(LocateError::Geolocation(failure)) => {
                    info!(message = failure.user_message(), "geolocation failure replayed");
                    true
                }
                Err(err) => {
                    warn!(error = %err, "geolocation failure not applied");
                    false
                }
                Ok(outcome) => {
                    warn!(?outcome, "failed geolocation reported a position");
                    false
                }
            }
        }
        FeedAction::CenterOn { kind, id } => {
            let now = engine.now();
            engine.advance_to(now);
            match engine.center_on(*kind, id) {
                Ok(position) => {
                    info!(%kind, id = %id, lat = position.lat(), lng = position.lng(), "centered");
                    true
                }
                Err(err) => {
                    info!(%kind, id = %id, error = %err, "nothing to center on");
                    false
                }
            }
        }
    }
}
