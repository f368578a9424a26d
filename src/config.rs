//! Planner configuration.
//!
//! Settings come from a TOML file with serde defaults for every field, so an
//! empty file (or none at all) is a valid configuration. API keys are read
//! from the environment only; the config file names the variable, never
//! the secret.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TravelMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub intent: IntentSettings,
    #[serde(default)]
    pub maps: MapsSettings,
    #[serde(default)]
    pub routing: RoutingSettings,
}

impl PlannerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Path to the schedule table.
    #[serde(default)]
    pub path: Option<String>,
    /// Year that yearless date phrases ("Dec 15") resolve into.
    #[serde(default = "default_season_year")]
    pub season_year: i32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            path: None,
            season_year: default_season_year(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSettings {
    /// Override for the generative-language endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_intent_key_env")]
    pub api_key_env: String,
}

impl IntentSettings {
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

impl Default for IntentSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            model: default_model(),
            api_key_env: default_intent_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsSettings {
    /// Override for the mapping endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_maps_key_env")]
    pub api_key_env: String,
    /// City context appended to venue names before geocoding.
    #[serde(default = "default_city")]
    pub city: String,
}

impl MapsSettings {
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

impl Default for MapsSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_maps_key_env(),
            city: default_city(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// Assumed concert length when the listing prints no end time.
    #[serde(default = "default_concert_minutes")]
    pub assumed_concert_minutes: i64,
    /// Persisted venue-coordinate cache.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    #[serde(default = "default_driving_speed")]
    pub driving_speed_kmh: f64,
    #[serde(default = "default_transit_speed")]
    pub transit_speed_kmh: f64,
    #[serde(default = "default_walking_speed")]
    pub walking_speed_kmh: f64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            assumed_concert_minutes: default_concert_minutes(),
            cache_path: default_cache_path(),
            driving_speed_kmh: default_driving_speed(),
            transit_speed_kmh: default_transit_speed(),
            walking_speed_kmh: default_walking_speed(),
        }
    }
}

fn default_season_year() -> i32 {
    2025
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_intent_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_maps_key_env() -> String {
    "GOOGLE_MAPS_API_KEY".to_string()
}

fn default_city() -> String {
    "Chennai, India".to_string()
}

fn default_concert_minutes() -> i64 {
    120
}

fn default_cache_path() -> String {
    "geocoding_cache.json".to_string()
}

fn default_driving_speed() -> f64 {
    TravelMode::Driving.fallback_speed_kmh()
}

fn default_transit_speed() -> f64 {
    TravelMode::Transit.fallback_speed_kmh()
}

fn default_walking_speed() -> f64 {
    TravelMode::Walking.fallback_speed_kmh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PlannerConfig::from_str("").unwrap();
        assert_eq!(config.schedule.season_year, 2025);
        assert_eq!(config.intent.model, "gemini-pro");
        assert_eq!(config.maps.city, "Chennai, India");
        assert_eq!(config.routing.assumed_concert_minutes, 120);
        assert_eq!(config.routing.walking_speed_kmh, 5.0);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = PlannerConfig::from_str(
            r#"
            [schedule]
            path = "2025_margazhi_schedule.txt"
            season_year = 2026

            [routing]
            assumed_concert_minutes = 90
            "#,
        )
        .unwrap();
        assert_eq!(
            config.schedule.path.as_deref(),
            Some("2025_margazhi_schedule.txt")
        );
        assert_eq!(config.schedule.season_year, 2026);
        assert_eq!(config.routing.assumed_concert_minutes, 90);
        // Untouched sections keep their defaults.
        assert_eq!(config.intent.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(PlannerConfig::from_str("[schedule\npath =").is_err());
    }
}
