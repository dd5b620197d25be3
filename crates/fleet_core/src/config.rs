use std::path::Path;

use bevy_ecs::prelude::Resource;
use serde::Deserialize;

use crate::clock::ONE_SEC_MS;
use crate::error::ConfigError;
use crate::geo::GeoPoint;

/// Default city centre: São Paulo (approx).
const DEFAULT_CENTER_LAT: f64 = -23.5505;
const DEFAULT_CENTER_LNG: f64 = -46.6333;

/// Default periodic pass interval: 30 seconds.
const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30 * ONE_SEC_MS;

/// Engine-wide settings. Every field has a default, so a config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize, Resource)]
#[serde(default)]
pub struct EngineConfig {
    /// Anchor marker position and centre for synthesized coordinates.
    pub city_center: GeoPoint,
    pub anchor_label: String,
    /// Max per-axis offset (degrees) of synthesized coordinates.
    pub synthetic_jitter_deg: f64,
    pub refresh_interval_ms: u64,
    /// Zoom used when centring on an entity.
    pub focus_zoom: u8,
    /// Zoom used when a self-location fix arrives.
    pub self_location_zoom: u8,
    /// How many online drivers the summary previews.
    pub online_preview_len: usize,
    /// Share (0.0–1.0) of completed-ride revenue kept by the platform.
    pub platform_commission_rate: f64,
    /// Seed for jitter and the waiting estimate. `None` uses entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            city_center: GeoPoint::from_degrees(DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG),
            anchor_label: "Operations center".to_string(),
            synthetic_jitter_deg: 0.05,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            focus_zoom: 16,
            self_location_zoom: 15,
            online_preview_len: 5,
            platform_commission_rate: 0.10,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let center = self.city_center;
        if GeoPoint::new(center.lat(), center.lng()).is_none() {
            return Err(ConfigError::Invalid(format!(
                "city_center ({}, {}) is not a valid coordinate",
                center.lat(),
                center.lng()
            )));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid("refresh_interval_ms must be > 0".into()));
        }
        if !self.synthetic_jitter_deg.is_finite() || self.synthetic_jitter_deg < 0.0 {
            return Err(ConfigError::Invalid(
                "synthetic_jitter_deg must be a non-negative number".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.platform_commission_rate) {
            return Err(ConfigError::Invalid(
                "platform_commission_rate must be within 0.0..=1.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard() {
        let config = EngineConfig::default();
        assert_eq!(config.city_center.lat(), -23.5505);
        assert_eq!(config.city_center.lng(), -46.6333);
        assert_eq!(config.refresh_interval_ms, 30_000);
        assert_eq!(config.online_preview_len, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"refresh_interval_ms": 5000, "seed": 9}"#)
            .expect("valid config");
        assert_eq!(config.refresh_interval_ms, 5_000);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.focus_zoom, 16);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"refresh_interval_ms": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"city_center": {"lat": 120.0, "lng": 0.0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
