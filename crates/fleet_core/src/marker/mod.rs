//! Marker reconciliation against a stateful map surface.

pub mod popup;
pub mod reconciler;
pub mod surface;

pub use reconciler::{
    MarkerCounters, MarkerFailure, MarkerHandle, MarkerKey, MarkerKind, MarkerReconciler,
    ReconcileReport, SelfLocationOutcome, SurfaceOperation,
};
pub use surface::{MapSurface, MarkerIcon, MarkerPopup, MarkerSpec, SurfaceId};
