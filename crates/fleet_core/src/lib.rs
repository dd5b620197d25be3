pub mod geo;
pub mod records;
pub mod presence;
pub mod snapshot;
pub mod filter;
pub mod marker;
pub mod view;
pub mod clock;
pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod geolocation;
pub mod runner;
pub mod systems;

#[cfg(feature = "live")]
pub mod live;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
