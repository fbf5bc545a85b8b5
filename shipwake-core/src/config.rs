//! Detection thresholds
//!
//! [`DetectionConfig`] deserializes with `#[serde(default)]`, so a partial
//! JSON document only overrides the fields it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Thresholds and toggles for the encounter engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionConfig {
    /// Ship-to-ship transfer distance in meters
    pub sts_transfer_threshold: f64,

    /// Rendezvous distance in meters
    pub rendezvous_threshold: f64,

    /// Close approach distance in meters
    pub close_approach_threshold: f64,

    /// Outer distance band in meters; a pair inside it has an open session
    pub formation_threshold: f64,

    /// Shortest session worth classifying (ms)
    pub minimum_encounter_duration: i64,

    /// Sessions are split once they reach this length (ms)
    pub maximum_encounter_duration: i64,

    /// Knots
    pub slow_speed_threshold: f64,

    /// Knots
    pub stop_speed_threshold: f64,

    /// Scan grid step (ms)
    pub sampling_interval: i64,

    /// Encounters below this confidence are dropped
    pub confidence_threshold: f64,

    pub include_weather_data: bool,

    pub include_sea_state: bool,

    pub include_regulatory_zone: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            sts_transfer_threshold: 100.0,
            rendezvous_threshold: 500.0,
            close_approach_threshold: 1000.0,
            formation_threshold: 2000.0,
            minimum_encounter_duration: 5 * MINUTE_MS,
            maximum_encounter_duration: 24 * HOUR_MS,
            slow_speed_threshold: 3.0,
            stop_speed_threshold: 0.5,
            sampling_interval: MINUTE_MS,
            confidence_threshold: 0.6,
            include_weather_data: false,
            include_sea_state: false,
            include_regulatory_zone: false,
        }
    }
}

/// Reasons a [`DetectionConfig`] is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("distance bands must widen: {narrower} ({narrower_value} m) exceeds {wider} ({wider_value} m)")]
    UnorderedBands {
        narrower: &'static str,
        narrower_value: f64,
        wider: &'static str,
        wider_value: f64,
    },

    #[error("minimumEncounterDuration ({minimum} ms) exceeds maximumEncounterDuration ({maximum} ms)")]
    DurationRange { minimum: i64, maximum: i64 },

    #[error("{name} must not be negative (got {value} ms)")]
    NegativeDuration { name: &'static str, value: i64 },

    #[error("samplingInterval must be positive (got {0} ms)")]
    SamplingInterval(i64),

    #[error("confidenceThreshold must lie in [0, 1] (got {0})")]
    ConfidenceThreshold(f64),

    #[error("stopSpeedThreshold ({stop} kn) exceeds slowSpeedThreshold ({slow} kn)")]
    SpeedOrder { stop: f64, slow: f64 },
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

impl DetectionConfig {
    /// Parse a (possibly partial) JSON config
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Distance bands from narrowest to widest
    fn bands(&self) -> [(&'static str, f64); 4] {
        [
            ("stsTransferThreshold", self.sts_transfer_threshold),
            ("rendezvousThreshold", self.rendezvous_threshold),
            ("closeApproachThreshold", self.close_approach_threshold),
            ("formationThreshold", self.formation_threshold),
        ]
    }

    /// Check the config for values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bands = self.bands();
        for (name, value) in bands {
            check_threshold(name, value)?;
        }
        for pair in bands.windows(2) {
            let (narrower, narrower_value) = pair[0];
            let (wider, wider_value) = pair[1];
            if narrower_value > wider_value {
                return Err(ConfigError::UnorderedBands {
                    narrower,
                    narrower_value,
                    wider,
                    wider_value,
                });
            }
        }

        check_threshold("slowSpeedThreshold", self.slow_speed_threshold)?;
        check_threshold("stopSpeedThreshold", self.stop_speed_threshold)?;
        if self.stop_speed_threshold > self.slow_speed_threshold {
            return Err(ConfigError::SpeedOrder {
                stop: self.stop_speed_threshold,
                slow: self.slow_speed_threshold,
            });
        }

        if self.minimum_encounter_duration < 0 {
            return Err(ConfigError::NegativeDuration {
                name: "minimumEncounterDuration",
                value: self.minimum_encounter_duration,
            });
        }
        if self.minimum_encounter_duration > self.maximum_encounter_duration {
            return Err(ConfigError::DurationRange {
                minimum: self.minimum_encounter_duration,
                maximum: self.maximum_encounter_duration,
            });
        }

        if self.sampling_interval <= 0 {
            return Err(ConfigError::SamplingInterval(self.sampling_interval));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ConfidenceThreshold(self.confidence_threshold));
        }

        Ok(())
    }
}
