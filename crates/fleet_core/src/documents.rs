//! Decoding of document-store payloads into typed records.
//!
//! Documents are loose JSON objects. The operations store writes Portuguese
//! field names and status values (`nome`, `em_andamento`, ...), newer clients
//! write English ones; both are accepted. Numbers may arrive as numeric
//! strings, timestamps as epoch milliseconds, RFC 3339 strings or
//! `{seconds, nanoseconds}` objects. A field that cannot be read is treated as
//! absent; only a document without an id is skipped.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::records::{
    DriverRecord, DriverStatus, EntityKind, PassengerRecord, RideRecord, RideStatus,
};
use crate::snapshot::Snapshot;

type Document = Map<String, Value>;

/// A decoded snapshot plus how many documents had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSnapshot {
    pub snapshot: Snapshot,
    pub skipped: usize,
}

/// Decodes a JSON array of documents of `kind`.
pub fn decode_snapshot(kind: EntityKind, payload: &Value) -> Result<DecodedSnapshot, DecodeError> {
    let documents = payload.as_array().ok_or(DecodeError::NotAnArray(kind))?;
    let mut skipped = 0;

    let snapshot = match kind {
        EntityKind::Drivers => Snapshot::Drivers(decode_all(documents, decode_driver, &mut skipped)),
        EntityKind::Rides => Snapshot::Rides(decode_all(documents, decode_ride, &mut skipped)),
        EntityKind::Passengers => {
            Snapshot::Passengers(decode_all(documents, decode_passenger, &mut skipped))
        }
    };
    if skipped > 0 {
        tracing::warn!(%kind, skipped, "skipped documents without a usable id");
    }
    Ok(DecodedSnapshot { snapshot, skipped })
}

fn decode_all<T>(
    documents: &[Value],
    decode: fn(&Document) -> Option<T>,
    skipped: &mut usize,
) -> Vec<T> {
    documents
        .iter()
        .filter_map(|value| {
            let decoded = value.as_object().and_then(decode);
            if decoded.is_none() {
                *skipped += 1;
            }
            decoded
        })
        .collect()
}

pub fn decode_driver(doc: &Document) -> Option<DriverRecord> {
    let mut driver = DriverRecord::new(id(doc)?);
    driver.display_name = text(doc, &["display_name", "name", "nome"]);
    driver.vehicle = text(doc, &["vehicle", "veiculo"]);
    driver.email = text(doc, &["email"]);
    driver.phone = text(doc, &["phone", "telefone"]);
    driver.status = text(doc, &["status"])
        .map(|s| driver_status(&s))
        .unwrap_or_default();
    driver.rating = number(doc, &["rating", "avaliacao"]).filter(|r| (0.0..=5.0).contains(r));
    driver.latitude = number(doc, &["latitude", "lat"]);
    driver.longitude = number(doc, &["longitude", "lng"]);
    driver.in_ride = flag(doc, &["in_ride", "em_corrida"]);
    driver.last_heartbeat_at = timestamp(doc, &["last_heartbeat_at", "ultimo_heartbeat"]);
    driver.last_update_at = timestamp(doc, &["last_update_at", "ultimo_update"]);
    Some(driver)
}

pub fn decode_ride(doc: &Document) -> Option<RideRecord> {
    let mut ride = RideRecord::new(id(doc)?);
    ride.origin_label = text(doc, &["origin_label", "origem"]);
    ride.destination_label = text(doc, &["destination_label", "destino"]);
    ride.passenger_name = text(doc, &["passenger_name", "passageiro_nome"]);
    ride.driver_name = text(doc, &["driver_name", "motorista_nome"]);
    ride.status = text(doc, &["status"])
        .map(|s| ride_status(&s))
        .unwrap_or(RideStatus::Unknown);
    ride.fare = number(doc, &["fare", "valor"]).unwrap_or(0.0);
    ride.origin_latitude = number(doc, &["origin_latitude", "origem_lat"]);
    ride.origin_longitude = number(doc, &["origin_longitude", "origem_lng"]);
    ride.created_at = timestamp(doc, &["created_at", "data_criacao"]);
    Some(ride)
}

pub fn decode_passenger(doc: &Document) -> Option<PassengerRecord> {
    let mut passenger = PassengerRecord::new(id(doc)?);
    passenger.name = text(doc, &["name", "nome"]);
    passenger.email = text(doc, &["email"]);
    passenger.phone = text(doc, &["phone", "telefone"]);
    passenger.ride_count = number(doc, &["ride_count", "total_corridas"])
        .filter(|n| *n >= 0.0)
        .map(|n| n.min(u32::MAX as f64) as u32)
        .unwrap_or(0);
    passenger.total_spent = number(doc, &["total_spent", "gasto_total"]).unwrap_or(0.0);
    passenger.registered_at = timestamp(doc, &["registered_at", "data_cadastro"]);
    Some(passenger)
}

/// `ativo` marks an approved account, not a driver on shift, so it stays `Other`
/// and never counts as online.
fn driver_status(raw: &str) -> DriverStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pendente" => DriverStatus::Pending,
        "inativo" => DriverStatus::Offline,
        other => DriverStatus::parse(other),
    }
}

fn ride_status(raw: &str) -> RideStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pendente" => RideStatus::Pending,
        "aceita" => RideStatus::Accepted,
        "em_andamento" => RideStatus::InProgress,
        "concluida" => RideStatus::Completed,
        "cancelada" => RideStatus::Canceled,
        other => RideStatus::parse(other),
    }
}

fn field<'a>(doc: &'a Document, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| doc.get(*key))
        .find(|value| !value.is_null())
}

fn id(doc: &Document) -> Option<String> {
    match field(doc, &["id"])? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(doc: &Document, keys: &[&str]) -> Option<String> {
    match field(doc, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite numbers only; numeric strings are accepted.
fn number(doc: &Document, keys: &[&str]) -> Option<f64> {
    let value = match field(doc, keys)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn flag(doc: &Document, keys: &[&str]) -> bool {
    match field(doc, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        _ => false,
    }
}

/// Epoch milliseconds from any of the accepted timestamp shapes.
fn timestamp(doc: &Document, keys: &[&str]) -> Option<u64> {
    match field(doc, keys)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ms) = s.parse::<u64>() {
                return Some(ms);
            }
            let parsed = DateTime::parse_from_rfc3339(s).ok()?;
            u64::try_from(parsed.timestamp_millis()).ok()
        }
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_u64)?;
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Some(seconds.saturating_mul(1000).saturating_add(nanos / 1_000_000))
        }
        _ => None,
    }
}
