//! Error types. None of these are fatal to the engine; each degrades to the
//! best state already on hand.

use thiserror::Error;

use crate::geolocation::GeolocationFailure;
use crate::records::EntityKind;

/// A collection stream delivered an error instead of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} stream failed: {message}")]
pub struct TransportError {
    pub kind: EntityKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: EntityKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The map surface rejected an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("map surface rejected the operation: {0}")]
    Rejected(String),
    #[error("map surface has no object with id {0}")]
    UnknownObject(u64),
    #[error("map surface is unavailable")]
    Unavailable,
}

/// `center_on` could not reveal the requested entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FocusError {
    #[error("no {kind} marker is rendered for id `{id}`")]
    NotRendered { kind: EntityKind, id: String },
    #[error("{0} are never placed on the map")]
    NotMappable(EntityKind),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("engine has been disposed")]
    Disposed,
}

/// A self-location request could not be shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error(transparent)]
    Geolocation(#[from] GeolocationFailure),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("engine has been disposed")]
    Disposed,
}

/// A stream document could not be turned into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected a JSON array of {0} documents")]
    NotAnArray(EntityKind),
    #[error("malformed feed line: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
