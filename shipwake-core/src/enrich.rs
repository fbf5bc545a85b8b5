//! Pluggable enrichment capabilities
//!
//! The engine never looks anything up itself. Environmental context, cargo
//! guesses and volume estimates come from these traits, which callers can
//! replace with real data sources. The defaults return fixed placeholders.

use crate::geo::Position;

/// Weather at a position and time, as a qualitative label
pub trait WeatherLookup: Send + Sync {
    fn lookup(&self, position: &Position, timestamp: i64) -> String;
}

/// Sea state at a position and time, as a qualitative label
pub trait SeaStateLookup: Send + Sync {
    fn lookup(&self, position: &Position, timestamp: i64) -> String;
}

/// Jurisdiction covering a position
pub trait RegulatoryZoneLookup: Send + Sync {
    fn lookup(&self, position: &Position, timestamp: i64) -> String;
}

/// Guess what cargo a pair of vessels is moving
pub trait CargoClassifier: Send + Sync {
    fn classify(&self, vessel1: &str, vessel2: &str) -> Option<String>;
}

/// Estimate the volume moved during a transfer
pub trait VolumeEstimator: Send + Sync {
    /// `average_speeds` are in knots, `duration` in milliseconds. Returns
    /// barrels.
    fn estimate(&self, duration: i64, average_speeds: (f64, f64), slow_speed_threshold: f64) -> f64;
}

/// Returns the same label for every query
#[derive(Debug, Clone)]
pub struct FixedLabel(pub String);

impl FixedLabel {
    pub fn new(label: impl Into<String>) -> Self {
        FixedLabel(label.into())
    }
}

impl WeatherLookup for FixedLabel {
    fn lookup(&self, _position: &Position, _timestamp: i64) -> String {
        self.0.clone()
    }
}

impl SeaStateLookup for FixedLabel {
    fn lookup(&self, _position: &Position, _timestamp: i64) -> String {
        self.0.clone()
    }
}

impl RegulatoryZoneLookup for FixedLabel {
    fn lookup(&self, _position: &Position, _timestamp: i64) -> String {
        self.0.clone()
    }
}

pub const DEFAULT_WEATHER: &str = "clear";
pub const DEFAULT_SEA_STATE: &str = "calm";
pub const DEFAULT_REGULATORY_ZONE: &str = "international waters";

/// Cargo vocabulary used by [`VesselIdHashClassifier`]
pub const CARGO_TYPES: [&str; 5] = ["crude_oil", "refined_products", "lng", "lpg", "chemicals"];

/// Placeholder cargo guess: sums the characters of both vessel ids and picks
/// an entry from [`CARGO_TYPES`].
///
/// Stable for a given pair, in either order. Carries no real information.
#[derive(Debug, Clone, Copy, Default)]
pub struct VesselIdHashClassifier;

impl CargoClassifier for VesselIdHashClassifier {
    fn classify(&self, vessel1: &str, vessel2: &str) -> Option<String> {
        let sum: u64 = vessel1.chars().chain(vessel2.chars()).map(|c| c as u64).sum();
        let index = (sum % CARGO_TYPES.len() as u64) as usize;
        Some(CARGO_TYPES[index].to_string())
    }
}

/// Barrels per hour of transfer
pub const TRANSFER_RATE_BBL_PER_HOUR: f64 = 5000.0;

/// Largest uplift applied for a fully stationary transfer
pub const MAX_VOLUME_UPLIFT: f64 = 0.3;

/// Transfer rate times duration, with up to 30% uplift the slower the pair
/// drifted.
///
/// Deterministic: the same encounter always gets the same estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateVolumeEstimator;

impl VolumeEstimator for RateVolumeEstimator {
    fn estimate(&self, duration: i64, average_speeds: (f64, f64), slow_speed_threshold: f64) -> f64 {
        let hours = duration.max(0) as f64 / 3_600_000.0;
        let mean_speed = (average_speeds.0 + average_speeds.1) / 2.0;
        let slowness = if slow_speed_threshold > 0.0 {
            (1.0 - mean_speed / slow_speed_threshold).clamp(0.0, 1.0)
        } else {
            0.0
        };
        TRANSFER_RATE_BBL_PER_HOUR * hours * (1.0 + MAX_VOLUME_UPLIFT * slowness)
    }
}

/// The set of capabilities the classifier consults
pub struct Enrichment {
    pub weather: Box<dyn WeatherLookup>,
    pub sea_state: Box<dyn SeaStateLookup>,
    pub regulatory_zone: Box<dyn RegulatoryZoneLookup>,
    pub cargo: Box<dyn CargoClassifier>,
    pub volume: Box<dyn VolumeEstimator>,
}

impl Default for Enrichment {
    fn default() -> Self {
        Enrichment {
            weather: Box::new(FixedLabel::new(DEFAULT_WEATHER)),
            sea_state: Box::new(FixedLabel::new(DEFAULT_SEA_STATE)),
            regulatory_zone: Box::new(FixedLabel::new(DEFAULT_REGULATORY_ZONE)),
            cargo: Box::new(VesselIdHashClassifier),
            volume: Box::new(RateVolumeEstimator),
        }
    }
}

impl std::fmt::Debug for Enrichment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enrichment").finish_non_exhaustive()
    }
}
